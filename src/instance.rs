//! Module for building, parsing and representing TSP instances.
//!
//! An instance is a set of cities together with a dense, possibly asymmetric
//! cost matrix. Missing edges (and the diagonal) are stored as `f64::INFINITY`.
//! Instances come from TSP-LIB files, from an explicit matrix, from any slice
//! of values implementing [`CostTo`], or from the random scenario generator.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};

/// Scale factor applied to geometric distances before rounding them up.
pub const MAP_SCALE: f64 = 1000.0;

/// Pairwise traversal cost between two cities.
///
/// Costs need not be symmetric and may be `f64::INFINITY` for an edge that
/// does not exist.
pub trait CostTo {
    fn cost_to(&self, other: &Self) -> f64;
}

/// A city placed on the plane, with an elevation making uphill travel dearer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// City identifier (0-indexed)
    pub id: usize,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Elevation; zero for every city gives a symmetric cost model
    pub elevation: f64,
}

impl City {
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        City { id, x, y, elevation: 0.0 }
    }

    pub fn with_elevation(id: usize, x: f64, y: f64, elevation: f64) -> Self {
        City { id, x, y, elevation }
    }

    /// TSP-LIB `EUC_2D` distance: planar distance rounded to the nearest integer
    pub fn euc_2d(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt().round()
    }
}

impl CostTo for City {
    fn cost_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let climb = other.elevation - self.elevation;
        let cost = ((dx * dx + dy * dy).sqrt() + climb).max(0.0);
        (cost * MAP_SCALE).ceil()
    }
}

/// Shape of a randomly generated scenario.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Difficulty {
    /// Symmetric Euclidean costs, complete graph
    Easy,
    /// Symmetric Euclidean costs with some edges removed
    Normal,
    /// Asymmetric elevation-dependent costs with some edges removed
    Hard,
}

/// Random scenario parameters
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Number of cities
    pub size: usize,
    /// Kind of cost model to generate
    pub difficulty: Difficulty,
    /// Width of the rectangle cities are drawn from, centred on the origin
    pub width: f64,
    /// Height of the rectangle cities are drawn from, centred on the origin
    pub height: f64,
    /// Fraction of edges removed for `Normal` and `Hard` scenarios
    pub removal_fraction: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            size: 10,
            difficulty: Difficulty::Hard,
            width: 3.0,
            height: 2.0,
            removal_fraction: 0.2,
        }
    }
}

/// A complete TSP instance
#[derive(Debug, Clone)]
pub struct TspInstance {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// Number of cities
    pub dimension: usize,
    /// Cities, when the instance has a geometric origin (empty for explicit matrices)
    pub cities: Vec<City>,
    /// Dense cost matrix, row = from, column = to
    pub cost_matrix: Vec<Vec<f64>>,
}

impl TspInstance {
    /// Build an instance by querying `cost_to` for every ordered pair.
    pub fn from_cities<C: CostTo>(name: &str, cities: &[C]) -> Result<Self> {
        if cities.is_empty() {
            return Err(SolverError::invalid_input("instance has no cities"));
        }
        let n = cities.len();
        let mut matrix = vec![vec![f64::INFINITY; n]; n];
        for (i, from) in cities.iter().enumerate() {
            for (j, to) in cities.iter().enumerate() {
                if i != j {
                    matrix[i][j] = from.cost_to(to);
                }
            }
        }
        Self::from_matrix(name, matrix)
    }

    /// Build an instance from an explicit cost matrix.
    ///
    /// The diagonal is forced to infinity. NaN and negative entries are rejected.
    pub fn from_matrix(name: &str, mut matrix: Vec<Vec<f64>>) -> Result<Self> {
        let n = matrix.len();
        if n == 0 {
            return Err(SolverError::invalid_input("instance has no cities"));
        }
        for (i, row) in matrix.iter_mut().enumerate() {
            if row.len() != n {
                return Err(SolverError::invalid_input(format!(
                    "row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            for (j, cost) in row.iter().enumerate() {
                if cost.is_nan() || *cost < 0.0 {
                    return Err(SolverError::invalid_input(format!(
                        "cost ({}, {}) = {} is not a non-negative number",
                        i, j, cost
                    )));
                }
            }
            row[i] = f64::INFINITY;
        }

        Ok(TspInstance {
            name: name.to_string(),
            comment: String::new(),
            dimension: n,
            cities: Vec::new(),
            cost_matrix: matrix,
        })
    }

    /// Generate a random scenario.
    ///
    /// Edge removal spares a hidden random Hamiltonian cycle, so every
    /// generated scenario admits at least one tour.
    pub fn generate<R: Rng>(config: &ScenarioConfig, rng: &mut R) -> Result<Self> {
        if config.size == 0 {
            return Err(SolverError::invalid_input("scenario size must be positive"));
        }
        if !(0.0..=1.0).contains(&config.removal_fraction) {
            return Err(SolverError::invalid_input(format!(
                "removal fraction {} is outside [0, 1]",
                config.removal_fraction
            )));
        }
        let n = config.size;
        let hard = config.difficulty == Difficulty::Hard;

        let cities: Vec<City> = (0..n)
            .map(|id| {
                let x = (rng.gen::<f64>() - 0.5) * config.width;
                let y = (rng.gen::<f64>() - 0.5) * config.height;
                let elevation = if hard { rng.gen::<f64>() } else { 0.0 };
                City::with_elevation(id, x, y, elevation)
            })
            .collect();

        let name = format!("{:?}-{}", config.difficulty, n).to_lowercase();
        let mut instance = Self::from_cities(&name, &cities)?;
        instance.cities = cities;

        if config.difficulty != Difficulty::Easy && n > 3 {
            let mut order: Vec<usize> = (0..n).collect();
            order.shuffle(rng);
            let mut kept = vec![vec![false; n]; n];
            for k in 0..n {
                let (a, b) = (order[k], order[(k + 1) % n]);
                kept[a][b] = true;
                if !hard {
                    kept[b][a] = true;
                }
            }

            for i in 0..n {
                let first_j = if hard { 0 } else { i + 1 };
                for j in first_j..n {
                    if i == j || kept[i][j] || !rng.gen_bool(config.removal_fraction) {
                        continue;
                    }
                    instance.cost_matrix[i][j] = f64::INFINITY;
                    if !hard {
                        instance.cost_matrix[j][i] = f64::INFINITY;
                    }
                }
            }
        }

        instance.comment = format!(
            "random {:?} scenario, {} cities",
            config.difficulty, n
        );
        log::debug!("Generated scenario {} ({} cities)", instance.name, n);
        Ok(instance)
    }

    /// Parse a TSP-LIB file (EUC_2D coordinates or EXPLICIT FULL_MATRIX weights)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path)?;
        let mut instance = Self::parse(&text)?;
        if instance.name.is_empty() {
            instance.name = path
                .as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
        }
        Ok(instance)
    }

    /// Parse TSP-LIB text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension = 0usize;
        let mut explicit = false;
        let mut coords: Vec<City> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();

        let mut section = "";

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();

            if line.is_empty() || line == "EOF" {
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                match key.trim() {
                    "NAME" => {
                        name = value.to_string();
                        continue;
                    }
                    "COMMENT" => {
                        comment = value.to_string();
                        continue;
                    }
                    "TYPE" => continue,
                    "DIMENSION" => {
                        dimension = value
                            .parse()
                            .map_err(|_| SolverError::parse(line_no, "invalid dimension"))?;
                        continue;
                    }
                    "EDGE_WEIGHT_TYPE" => {
                        explicit = match value {
                            "EXPLICIT" => true,
                            "EUC_2D" => false,
                            other => {
                                return Err(SolverError::parse(
                                    line_no,
                                    format!("unsupported edge weight type {}", other),
                                ))
                            }
                        };
                        continue;
                    }
                    "EDGE_WEIGHT_FORMAT" => {
                        if value != "FULL_MATRIX" {
                            return Err(SolverError::parse(
                                line_no,
                                format!("unsupported edge weight format {}", value),
                            ));
                        }
                        continue;
                    }
                    _ => {}
                }
            }

            if line.starts_with("NODE_COORD_SECTION") {
                section = "coords";
                continue;
            }
            if line.starts_with("EDGE_WEIGHT_SECTION") {
                section = "weights";
                continue;
            }
            if line.starts_with("DISPLAY_DATA_SECTION") {
                section = "display";
                continue;
            }

            match section {
                "coords" => {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    if parts.len() < 3 {
                        return Err(SolverError::parse(line_no, "expected `id x y`"));
                    }
                    let id: usize = parts[0]
                        .parse()
                        .map_err(|_| SolverError::parse(line_no, "invalid node id"))?;
                    let x: f64 = parts[1]
                        .parse()
                        .map_err(|_| SolverError::parse(line_no, "invalid x coordinate"))?;
                    let y: f64 = parts[2]
                        .parse()
                        .map_err(|_| SolverError::parse(line_no, "invalid y coordinate"))?;
                    if id == 0 {
                        return Err(SolverError::parse(line_no, "node ids are 1-indexed"));
                    }
                    coords.push(City::new(id - 1, x, y));
                }
                "weights" => {
                    for token in line.split_whitespace() {
                        let w: f64 = token.parse().map_err(|_| {
                            SolverError::parse(line_no, format!("invalid edge weight {}", token))
                        })?;
                        weights.push(w);
                    }
                }
                _ => {}
            }
        }

        if dimension == 0 {
            return Err(SolverError::invalid_input("missing or zero DIMENSION"));
        }

        let mut instance = if explicit {
            if weights.len() != dimension * dimension {
                return Err(SolverError::invalid_input(format!(
                    "expected {} edge weights, found {}",
                    dimension * dimension,
                    weights.len()
                )));
            }
            let matrix = weights.chunks(dimension).map(|row| row.to_vec()).collect();
            Self::from_matrix(&name, matrix)?
        } else {
            if coords.len() != dimension {
                return Err(SolverError::invalid_input(format!(
                    "expected {} coordinates, found {}",
                    dimension,
                    coords.len()
                )));
            }
            coords.sort_by_key(|c| c.id);
            let matrix: Vec<Vec<f64>> = coords
                .iter()
                .map(|a| coords.iter().map(|b| a.euc_2d(b)).collect())
                .collect();
            let mut instance = Self::from_matrix(&name, matrix)?;
            instance.cities = coords;
            instance
        };
        instance.comment = comment;
        Ok(instance)
    }

    /// Write the instance as TSP-LIB text with an explicit full matrix.
    pub fn to_tsplib(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "NAME: {}", self.name);
        if !self.comment.is_empty() {
            let _ = writeln!(out, "COMMENT: {}", self.comment);
        }
        let _ = writeln!(out, "TYPE: ATSP");
        let _ = writeln!(out, "DIMENSION: {}", self.dimension);
        let _ = writeln!(out, "EDGE_WEIGHT_TYPE: EXPLICIT");
        let _ = writeln!(out, "EDGE_WEIGHT_FORMAT: FULL_MATRIX");
        let _ = writeln!(out, "EDGE_WEIGHT_SECTION");
        for row in &self.cost_matrix {
            let line: Vec<String> = row
                .iter()
                .map(|c| if c.is_finite() { format!("{}", c) } else { "inf".to_string() })
                .collect();
            let _ = writeln!(out, "{}", line.join(" "));
        }
        if !self.cities.is_empty() {
            let _ = writeln!(out, "DISPLAY_DATA_SECTION");
            for c in &self.cities {
                let _ = writeln!(out, "{} {} {}", c.id + 1, c.x, c.y);
            }
        }
        out.push_str("EOF\n");
        out
    }

    /// Save the instance as a TSP-LIB file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_tsplib())?;
        Ok(())
    }

    /// Cost of travelling from `i` to `j`
    #[inline]
    pub fn cost(&self, i: usize, j: usize) -> f64 {
        self.cost_matrix[i][j]
    }

    /// Check that `route` visits every city exactly once
    pub fn is_valid_tour(&self, route: &[usize]) -> bool {
        if route.len() != self.dimension {
            return false;
        }
        let mut seen = vec![false; self.dimension];
        for &c in route {
            if c >= self.dimension || seen[c] {
                return false;
            }
            seen[c] = true;
        }
        true
    }

    /// Total cost of the cycle described by `route`, closing edge included.
    ///
    /// Infinite when the route is empty, is not a permutation of all cities or
    /// uses a missing edge. A single city is a zero-cost tour.
    pub fn tour_cost(&self, route: &[usize]) -> f64 {
        if route.is_empty() || !self.is_valid_tour(route) {
            return f64::INFINITY;
        }
        if route.len() == 1 {
            return 0.0;
        }

        let mut cost = 0.0;
        for w in route.windows(2) {
            cost += self.cost(w[0], w[1]);
        }
        cost + self.cost(route[route.len() - 1], route[0])
    }

    /// Whether some ordered pair has a cost differing from its reverse
    pub fn is_asymmetric(&self) -> bool {
        (0..self.dimension).any(|i| {
            (i + 1..self.dimension).any(|j| self.cost(i, j) != self.cost(j, i))
        })
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.dimension;
        let finite: Vec<f64> = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| self.cost(i, j))
            .filter(|c| c.is_finite())
            .collect();
        let total_edges = n * n.saturating_sub(1);

        let (min_cost, avg_cost, max_cost) = if finite.is_empty() {
            (f64::INFINITY, f64::INFINITY, f64::INFINITY)
        } else {
            (
                finite.iter().cloned().fold(f64::INFINITY, f64::min),
                finite.iter().sum::<f64>() / finite.len() as f64,
                finite.iter().cloned().fold(0.0, f64::max),
            )
        };

        InstanceStatistics {
            name: self.name.clone(),
            dimension: n,
            edges: finite.len(),
            missing_edges: total_edges - finite.len(),
            asymmetric: self.is_asymmetric(),
            min_cost,
            avg_cost,
            max_cost,
        }
    }
}

/// Statistics about a TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub edges: usize,
    pub missing_edges: usize,
    pub asymmetric: bool,
    pub min_cost: f64,
    pub avg_cost: f64,
    pub max_cost: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Cities: {}", self.dimension)?;
        writeln!(f, "  Edges: {} ({} missing)", self.edges, self.missing_edges)?;
        writeln!(f, "  Asymmetric: {}", self.asymmetric)?;
        writeln!(f, "  Min cost: {:.2}", self.min_cost)?;
        writeln!(f, "  Avg cost: {:.2}", self.avg_cost)?;
        writeln!(f, "  Max cost: {:.2}", self.max_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    const INF: f64 = f64::INFINITY;

    #[test]
    fn test_city_costs() {
        let a = City::new(0, 0.0, 0.0);
        let b = City::new(1, 3.0, 4.0);
        assert_eq!(a.cost_to(&b), 5000.0);
        assert_eq!(b.cost_to(&a), 5000.0);

        let low = City::with_elevation(0, 0.0, 0.0, 0.0);
        let high = City::with_elevation(1, 1.0, 0.0, 0.5);
        assert_eq!(low.cost_to(&high), 1500.0);
        assert_eq!(high.cost_to(&low), 500.0);
    }

    #[test]
    fn test_from_matrix_validation() {
        assert!(TspInstance::from_matrix("empty", vec![]).is_err());
        assert!(TspInstance::from_matrix("ragged", vec![vec![0.0, 1.0], vec![1.0]]).is_err());
        assert!(TspInstance::from_matrix("neg", vec![vec![0.0, -1.0], vec![1.0, 0.0]]).is_err());
        assert!(TspInstance::from_matrix("nan", vec![vec![0.0, f64::NAN], vec![1.0, 0.0]]).is_err());

        let inst = TspInstance::from_matrix("ok", vec![vec![0.0, 2.0], vec![3.0, 0.0]]).unwrap();
        assert_eq!(inst.cost(0, 0), INF);
        assert_eq!(inst.cost(0, 1), 2.0);
        assert!(inst.is_asymmetric());
    }

    #[test]
    fn test_tour_cost() {
        let inst = TspInstance::from_matrix(
            "tri",
            vec![
                vec![INF, 1.0, 5.0],
                vec![4.0, INF, 2.0],
                vec![3.0, INF, INF],
            ],
        )
        .unwrap();
        assert_eq!(inst.tour_cost(&[0, 1, 2]), 6.0);
        assert_eq!(inst.tour_cost(&[0, 2, 1]), INF);
        assert_eq!(inst.tour_cost(&[0, 1]), INF);
        assert_eq!(inst.tour_cost(&[0, 1, 1]), INF);

        let single = TspInstance::from_matrix("one", vec![vec![0.0]]).unwrap();
        assert_eq!(single.tour_cost(&[0]), 0.0);

        let empty = TspInstance {
            name: "empty".to_string(),
            comment: String::new(),
            dimension: 0,
            cities: Vec::new(),
            cost_matrix: Vec::new(),
        };
        assert_eq!(empty.tour_cost(&[]), INF);
    }

    #[test]
    fn test_parse_explicit_round_trip() {
        let inst = TspInstance::from_matrix(
            "asym",
            vec![
                vec![INF, 1.0, 7.0],
                vec![2.0, INF, INF],
                vec![3.0, 4.0, INF],
            ],
        )
        .unwrap();
        let parsed = TspInstance::parse(&inst.to_tsplib()).unwrap();
        assert_eq!(parsed.name, "asym");
        assert_eq!(parsed.dimension, 3);
        assert_eq!(parsed.cost_matrix, inst.cost_matrix);
    }

    #[test]
    fn test_parse_euclidean() {
        let text = "NAME: square\nTYPE: TSP\nDIMENSION: 4\nEDGE_WEIGHT_TYPE: EUC_2D\n\
                    NODE_COORD_SECTION\n1 0 0\n2 1 0\n3 1 1\n4 0 1\nEOF\n";
        let inst = TspInstance::parse(text).unwrap();
        assert_eq!(inst.dimension, 4);
        assert_eq!(inst.cities.len(), 4);
        assert_eq!(inst.cost(0, 1), 1.0);
        assert_eq!(inst.tour_cost(&[0, 1, 2, 3]), 4.0);
    }

    #[test]
    fn test_parse_euclidean_rounds_to_nearest() {
        let text = "NAME: triangle\nTYPE: TSP\nDIMENSION: 4\nEDGE_WEIGHT_TYPE: EUC_2D\n\
                    NODE_COORD_SECTION\n1 0 0\n2 3 4\n3 0 4\n4 1.2 1.2\nEOF\n";
        let inst = TspInstance::parse(text).unwrap();
        assert_eq!(inst.cost(0, 1), 5.0);
        assert_eq!(inst.cost(1, 0), 5.0);
        assert_eq!(inst.cost(1, 2), 3.0);
        assert_eq!(inst.cost(2, 0), 4.0);
        // sqrt(2.88) = 1.697
        assert_eq!(inst.cost(0, 3), 2.0);
        assert_eq!(inst.cost(0, 0), f64::INFINITY);
        assert!(!inst.is_asymmetric());
    }

    #[test]
    fn test_parse_errors() {
        assert!(TspInstance::parse("NAME: x\n").is_err());
        let bad = "DIMENSION: 2\nEDGE_WEIGHT_TYPE: EXPLICIT\nEDGE_WEIGHT_SECTION\n0 1 x 0\n";
        match TspInstance::parse(bad) {
            Err(SolverError::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("unexpected {:?}", other),
        }
        let short = "DIMENSION: 2\nEDGE_WEIGHT_TYPE: EXPLICIT\nEDGE_WEIGHT_SECTION\n0 1 1\n";
        assert!(TspInstance::parse(short).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let inst = TspInstance::generate(&ScenarioConfig::default(), &mut rng).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hard.tsp");
        inst.save(&path).unwrap();
        let loaded = TspInstance::from_file(&path).unwrap();
        assert_eq!(loaded.cost_matrix, inst.cost_matrix);
    }

    #[test]
    fn test_generated_scenarios_keep_a_tour() {
        for difficulty in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            let config = ScenarioConfig {
                size: 12,
                difficulty,
                removal_fraction: 0.9,
                ..Default::default()
            };
            let mut rng = ChaCha8Rng::seed_from_u64(11);
            let inst = TspInstance::generate(&config, &mut rng).unwrap();
            assert_eq!(inst.dimension, 12);
            assert_eq!(inst.is_asymmetric(), difficulty == Difficulty::Hard);

            let stats = inst.statistics();
            if difficulty == Difficulty::Easy {
                assert_eq!(stats.missing_edges, 0);
            } else {
                assert!(stats.missing_edges > 0);
            }
            // each city keeps at least its hidden-cycle successor
            for i in 0..inst.dimension {
                assert!((0..inst.dimension).any(|j| inst.cost(i, j).is_finite()));
            }
        }
    }

    #[test]
    fn test_generate_rejects_bad_config() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for removal_fraction in [-0.1, 1.5, f64::NAN] {
            let config = ScenarioConfig {
                removal_fraction,
                ..Default::default()
            };
            assert!(matches!(
                TspInstance::generate(&config, &mut rng),
                Err(SolverError::InvalidInput(_))
            ));
        }
        let empty = ScenarioConfig {
            size: 0,
            ..Default::default()
        };
        assert!(TspInstance::generate(&empty, &mut rng).is_err());
    }
}
