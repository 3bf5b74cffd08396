//! Solution and result types.
//!
//! [`Solution`] is a complete tour produced by any algorithm in the crate.
//! [`SolveResult`] is what the branch-and-bound entry point returns: the best
//! tour together with the search statistics.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::exact::PriorityMetric;
use crate::instance::TspInstance;

/// Costs as JSON numbers, with the infinite "no tour" cost written as `null`.
mod cost_or_null {
    use super::*;

    pub fn serialize<S>(cost: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if cost.is_finite() {
            serializer.serialize_some(cost)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

/// A tour over all cities of an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// The tour as a sequence of city indices; the closing edge is implicit
    pub tour: Vec<usize>,
    /// Total tour cost, infinite when no tour was found
    #[serde(with = "cost_or_null")]
    pub cost: f64,
    /// Whether the tour is a complete cycle with finite cost
    pub feasible: bool,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// The "no solution" sentinel: infinite cost, empty tour
    pub fn none(algorithm: &str) -> Self {
        Solution {
            tour: Vec::new(),
            cost: f64::INFINITY,
            feasible: false,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Create a solution from a tour, evaluating it against the instance
    pub fn from_tour(instance: &TspInstance, tour: Vec<usize>, algorithm: &str) -> Self {
        let cost = instance.tour_cost(&tour);
        Solution {
            tour,
            cost,
            feasible: cost.is_finite(),
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Re-evaluate cost and feasibility after the tour was modified
    pub fn validate(&mut self, instance: &TspInstance) {
        self.cost = instance.tour_cost(&self.tour);
        self.feasible = self.cost.is_finite();
    }

    /// Cost change of swapping the cities at positions `i` and `j`
    pub fn swap_delta(&self, instance: &TspInstance, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        let mut new_tour = self.tour.clone();
        new_tour.swap(i, j);
        instance.tour_cost(&new_tour) - self.cost
    }

    pub fn apply_swap(&mut self, i: usize, j: usize) {
        self.tour.swap(i, j);
    }

    /// The tour rotated so that it starts at `city`
    pub fn rotated_to(&self, city: usize) -> Vec<usize> {
        match self.tour.iter().position(|&c| c == city) {
            Some(pos) => {
                let mut rotated = self.tour[pos..].to_vec();
                rotated.extend_from_slice(&self.tour[..pos]);
                rotated
            }
            None => self.tour.clone(),
        }
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Feasible: {}", self.feasible)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}

/// How a branch-and-bound run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The queue emptied: no state could beat the incumbent
    Exhausted,
    /// The time budget elapsed with states still queued
    TimedOut,
    /// Single-city instance, no search needed
    Trivial,
}

/// Counters collected during a branch-and-bound run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Complete tours reached as leaves
    pub leaves_found: usize,
    /// States placed on the queue (root children included)
    pub states_created: usize,
    /// States popped and expanded
    pub states_expanded: usize,
    /// Children rejected at creation plus popped states rejected on re-check
    pub states_pruned: usize,
    /// Largest queue length observed
    pub max_queue_size: usize,
    /// States still queued when the search stopped
    pub remaining_queue: usize,
}

/// Result of [`crate::exact::BranchAndBound::solve`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResult {
    /// Cost of the best tour, infinite when none exists
    #[serde(with = "cost_or_null")]
    pub cost: f64,
    /// Best tour as city indices, empty when none exists
    pub route: Vec<usize>,
    /// Wall-clock seconds, greedy seeding included
    pub elapsed: f64,
    /// Cost of the greedy seed tour
    #[serde(with = "cost_or_null")]
    pub initial_cost: f64,
    pub termination: Termination,
    pub priority: PriorityMetric,
    #[serde(flatten)]
    pub stats: SearchStats,
    /// `(elapsed seconds, cost)` of every incumbent improvement, greedy seed included
    pub history: Vec<(f64, f64)>,
}

impl SolveResult {
    /// Whether a finite-cost tour was found
    pub fn is_feasible(&self) -> bool {
        self.cost.is_finite()
    }

    /// Convert into a plain [`Solution`]
    pub fn to_solution(&self) -> Solution {
        Solution {
            tour: self.route.clone(),
            cost: self.cost,
            feasible: self.is_feasible(),
            algorithm: "BranchAndBound".to_string(),
            computation_time: self.elapsed,
            iterations: Some(self.stats.states_expanded),
        }
    }
}

impl std::fmt::Display for SolveResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Branch and bound ({:?}, {:?})", self.termination, self.priority)?;
        writeln!(f, "  Cost: {:.2} (greedy seed {:.2})", self.cost, self.initial_cost)?;
        writeln!(f, "  Time: {:.4}s", self.elapsed)?;
        writeln!(f, "  Leaves found: {}", self.stats.leaves_found)?;
        writeln!(f, "  States created: {}", self.stats.states_created)?;
        writeln!(f, "  States expanded: {}", self.stats.states_expanded)?;
        writeln!(f, "  States pruned: {}", self.stats.states_pruned)?;
        writeln!(f, "  Max queue size: {}", self.stats.max_queue_size)?;
        writeln!(f, "  Route: {:?}", self.route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> TspInstance {
        TspInstance::from_matrix(
            "square",
            vec![
                vec![0.0, 1.0, 4.0, 5.0],
                vec![1.0, 0.0, 2.0, 6.0],
                vec![4.0, 2.0, 0.0, 3.0],
                vec![5.0, 6.0, 3.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_solution_creation() {
        let sol = Solution::none("none");
        assert!(sol.tour.is_empty());
        assert!(!sol.feasible);
        assert_eq!(sol.cost, f64::INFINITY);

        let sol = Solution::from_tour(&square(), vec![0, 1, 2, 3], "manual");
        assert!(sol.feasible);
        assert_eq!(sol.cost, 11.0);
    }

    #[test]
    fn test_swap_delta_matches_apply() {
        let inst = square();
        let mut sol = Solution::from_tour(&inst, vec![0, 2, 1, 3], "manual");
        let delta = sol.swap_delta(&inst, 1, 2);
        sol.apply_swap(1, 2);
        let before = sol.cost;
        sol.validate(&inst);
        assert_eq!(sol.cost - before, delta);
        assert_eq!(sol.cost, 11.0);
    }

    #[test]
    fn test_rotation() {
        let sol = Solution::from_tour(&square(), vec![2, 3, 0, 1], "manual");
        assert_eq!(sol.rotated_to(0), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_json_keeps_missing_tour() {
        const INF: f64 = f64::INFINITY;
        let dead_end = TspInstance::from_matrix(
            "dead-end",
            vec![
                vec![INF, 1.0, 2.0],
                vec![3.0, INF, 4.0],
                vec![INF, INF, INF],
            ],
        )
        .unwrap();

        let result = crate::exact::solve(&dead_end, 10.0).unwrap();
        assert!(!result.is_feasible());
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"cost\":null"));
        let back: SolveResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cost, INF);
        assert_eq!(back.initial_cost, INF);
        assert!(back.route.is_empty());
        assert_eq!(back.stats, result.stats);

        let json = serde_json::to_string(&Solution::none("Greedy")).unwrap();
        let back: Solution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cost, INF);
        assert!(!back.feasible);
    }

    #[test]
    fn test_json_keeps_finite_cost() {
        let sol = Solution::from_tour(&square(), vec![0, 1, 2, 3], "manual");
        let json = serde_json::to_string(&sol).unwrap();
        let back: Solution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cost, 11.0);
        assert_eq!(back.tour, sol.tour);
    }
}
