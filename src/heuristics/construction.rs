//! Tour construction heuristics.
//!
//! These build a first complete tour quickly. The greedy tour seeds the
//! branch-and-bound incumbent; the random tour is a baseline.

use std::time::Instant;

use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::instance::TspInstance;
use crate::solution::Solution;

/// A heuristic producing a complete tour, or `Solution::none` on failure.
///
/// Randomness is only ever drawn from the RNG passed in.
pub trait TourConstructor {
    fn construct(&self, instance: &TspInstance, rng: &mut ChaCha8Rng) -> Solution;
    fn name(&self) -> &str;
}

/// Nearest Neighbor with random restarts
///
/// Walks from city 0 to the cheapest unvisited city until the tour is
/// complete. A dead end or a missing closing edge triggers a restart from a
/// random city.
pub struct GreedyTour {
    /// Time budget for restarts in seconds; the first walk always completes
    pub time_limit: f64,
    /// Maximum number of restarts after the first walk
    pub max_restarts: usize,
}

impl GreedyTour {
    pub fn new(time_limit: f64, max_restarts: usize) -> Self {
        GreedyTour {
            time_limit,
            max_restarts,
        }
    }

    fn walk(&self, instance: &TspInstance, start: usize) -> Option<Vec<usize>> {
        let n = instance.dimension;
        let mut visited = vec![false; n];
        let mut tour = Vec::with_capacity(n);
        let mut current = start;
        visited[start] = true;
        tour.push(start);

        while tour.len() < n {
            let next = (0..n)
                .filter(|&c| !visited[c])
                .map(|c| (c, instance.cost(current, c)))
                .filter(|&(_, cost)| cost.is_finite())
                .min_by_key(|&(_, cost)| OrderedFloat(cost))
                .map(|(c, _)| c)?;
            visited[next] = true;
            tour.push(next);
            current = next;
        }

        if n == 1 || instance.cost(current, start).is_finite() {
            Some(tour)
        } else {
            None
        }
    }
}

impl Default for GreedyTour {
    fn default() -> Self {
        GreedyTour::new(1.0, 100)
    }
}

impl TourConstructor for GreedyTour {
    fn construct(&self, instance: &TspInstance, rng: &mut ChaCha8Rng) -> Solution {
        let started = Instant::now();
        let n = instance.dimension;
        if n == 0 {
            return Solution::none(self.name());
        }

        let mut attempts = 0;
        let mut start_city = 0;
        let mut solution = loop {
            attempts += 1;
            if let Some(tour) = self.walk(instance, start_city) {
                break Solution::from_tour(instance, tour, self.name());
            }
            if attempts > self.max_restarts || started.elapsed().as_secs_f64() >= self.time_limit {
                log::debug!("Greedy tour failed after {} attempts", attempts);
                break Solution::none(self.name());
            }
            start_city = rng.gen_range(0..n);
        };

        solution.iterations = Some(attempts);
        solution.computation_time = started.elapsed().as_secs_f64();
        solution
    }

    fn name(&self) -> &str {
        "Greedy"
    }
}

/// Random permutations until one is a valid tour
pub struct RandomTour {
    pub time_limit: f64,
    pub max_attempts: usize,
}

impl RandomTour {
    pub fn new(time_limit: f64, max_attempts: usize) -> Self {
        RandomTour {
            time_limit,
            max_attempts,
        }
    }
}

impl Default for RandomTour {
    fn default() -> Self {
        RandomTour::new(1.0, 10_000)
    }
}

impl TourConstructor for RandomTour {
    fn construct(&self, instance: &TspInstance, rng: &mut ChaCha8Rng) -> Solution {
        let started = Instant::now();
        if instance.dimension == 0 {
            return Solution::none(self.name());
        }
        let mut tour: Vec<usize> = (0..instance.dimension).collect();
        let mut attempts = 0;

        let mut solution = loop {
            attempts += 1;
            tour.shuffle(rng);
            let candidate = Solution::from_tour(instance, tour.clone(), self.name());
            if candidate.feasible {
                break candidate;
            }
            if attempts >= self.max_attempts || started.elapsed().as_secs_f64() >= self.time_limit {
                break Solution::none(self.name());
            }
        };

        solution.iterations = Some(attempts);
        solution.computation_time = started.elapsed().as_secs_f64();
        solution
    }

    fn name(&self) -> &str {
        "Random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Difficulty, ScenarioConfig};

    const INF: f64 = f64::INFINITY;

    #[test]
    fn test_greedy_follows_nearest_neighbour() {
        let inst = TspInstance::from_matrix(
            "nn",
            vec![
                vec![INF, 1.0, 4.0, 5.0],
                vec![1.0, INF, 2.0, 6.0],
                vec![4.0, 2.0, INF, 3.0],
                vec![5.0, 6.0, 3.0, INF],
            ],
        )
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let sol = GreedyTour::default().construct(&inst, &mut rng);
        assert_eq!(sol.tour, vec![0, 1, 2, 3]);
        assert_eq!(sol.cost, 11.0);
        assert_eq!(sol.iterations, Some(1));
    }

    #[test]
    fn test_greedy_restarts_after_dead_end() {
        // from 0 the nearest neighbour walk 0-1-2 has no edge back to 0,
        // but 0-2-1 does
        let inst = TspInstance::from_matrix(
            "restart",
            vec![
                vec![INF, 1.0, 5.0],
                vec![9.0, INF, 1.0],
                vec![INF, 9.0, INF],
            ],
        )
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let sol = GreedyTour::default().construct(&inst, &mut rng);
        assert!(sol.feasible);
        assert_eq!(sol.cost, 5.0 + 9.0 + 9.0);
        assert!(sol.iterations.unwrap_or(0) > 1);
    }

    #[test]
    fn test_greedy_reports_failure() {
        let inst = TspInstance::from_matrix(
            "none",
            vec![vec![INF, 1.0, 1.0], vec![1.0, INF, 1.0], vec![INF, INF, INF]],
        )
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let sol = GreedyTour::new(1.0, 5).construct(&inst, &mut rng);
        assert!(!sol.feasible);
        assert!(sol.tour.is_empty());
        assert_eq!(sol.cost, INF);
        assert_eq!(sol.iterations, Some(6));
    }

    #[test]
    fn test_constructors_are_deterministic_per_seed() {
        let config = ScenarioConfig {
            size: 15,
            difficulty: Difficulty::Hard,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let inst = TspInstance::generate(&config, &mut rng).unwrap();

        let constructors: Vec<Box<dyn TourConstructor>> =
            vec![Box::new(GreedyTour::default()), Box::new(RandomTour::default())];
        for c in constructors {
            let a = c.construct(&inst, &mut ChaCha8Rng::seed_from_u64(4));
            let b = c.construct(&inst, &mut ChaCha8Rng::seed_from_u64(4));
            assert_eq!(a.tour, b.tour, "{}", c.name());
            if a.feasible {
                assert!(inst.is_valid_tour(&a.tour));
                assert_eq!(inst.tour_cost(&a.tour), a.cost);
            }
        }
    }

    #[test]
    fn test_single_city() {
        let inst = TspInstance::from_matrix("one", vec![vec![0.0]]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let sol = GreedyTour::default().construct(&inst, &mut rng);
        assert_eq!(sol.tour, vec![0]);
        assert_eq!(sol.cost, 0.0);
        let sol = RandomTour::default().construct(&inst, &mut rng);
        assert_eq!(sol.cost, 0.0);
    }

    #[test]
    fn test_no_cities_gives_no_tour() {
        let empty = TspInstance {
            name: "empty".to_string(),
            comment: String::new(),
            dimension: 0,
            cities: Vec::new(),
            cost_matrix: Vec::new(),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for sol in [
            RandomTour::default().construct(&empty, &mut rng),
            GreedyTour::default().construct(&empty, &mut rng),
        ] {
            assert!(sol.tour.is_empty());
            assert!(!sol.feasible);
            assert_eq!(sol.cost, INF);
        }
    }
}
