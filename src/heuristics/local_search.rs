//! Local search improvement heuristics.

use std::time::Instant;

use crate::instance::TspInstance;
use crate::solution::Solution;

/// Trait for local search improvement methods
pub trait LocalSearch {
    fn improve(&self, instance: &TspInstance, solution: &mut Solution) -> bool;
    fn name(&self) -> &str;
}

/// City Swap Local Search
///
/// Cycles a source position through the tour and tries swapping it with every
/// other position, keeping each strictly improving swap. Stops once every
/// ordered pair has been tried since the last improvement, or on timeout.
pub struct SwapSearch {
    /// Time limit in seconds
    pub time_limit: f64,
}

impl SwapSearch {
    pub fn new(time_limit: f64) -> Self {
        SwapSearch { time_limit }
    }
}

impl Default for SwapSearch {
    fn default() -> Self {
        Self::new(60.0)
    }
}

impl LocalSearch for SwapSearch {
    fn improve(&self, instance: &TspInstance, solution: &mut Solution) -> bool {
        let n = solution.tour.len();
        if n < 3 || !solution.feasible {
            return false;
        }

        let started = Instant::now();
        let total_pairs = n * (n - 1);
        let mut skipped = 0;
        let mut source = 0;
        let mut improvements = 0;

        while skipped < total_pairs && started.elapsed().as_secs_f64() < self.time_limit {
            for dest in 0..n {
                if dest == source {
                    continue;
                }
                let delta = solution.swap_delta(instance, source, dest);
                if delta < -1e-9 {
                    solution.apply_swap(source, dest);
                    solution.cost += delta;
                    improvements += 1;
                    skipped = 0;
                } else {
                    skipped += 1;
                }
            }
            source = (source + 1) % n;
        }

        solution.validate(instance);
        solution.iterations = Some(solution.iterations.unwrap_or(0) + improvements);
        log::debug!("Swap search: {} improvements, cost {:.2}", improvements, solution.cost);
        improvements > 0
    }

    fn name(&self) -> &str {
        "Swap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::construction::{RandomTour, TourConstructor};
    use crate::instance::{Difficulty, ScenarioConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_swap_never_worsens() {
        let config = ScenarioConfig {
            size: 12,
            difficulty: Difficulty::Easy,
            ..Default::default()
        };
        for seed in 0..5 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let inst = TspInstance::generate(&config, &mut rng).unwrap();
            let mut sol = RandomTour::default().construct(&inst, &mut rng);
            let before = sol.cost;
            SwapSearch::default().improve(&inst, &mut sol);
            assert!(sol.cost <= before);
            assert!(inst.is_valid_tour(&sol.tour));
            assert_eq!(inst.tour_cost(&sol.tour), sol.cost);
        }
    }

    #[test]
    fn test_swap_fixes_crossed_tour() {
        let inst = TspInstance::from_matrix(
            "square",
            vec![
                vec![0.0, 1.0, 4.0, 5.0],
                vec![1.0, 0.0, 2.0, 6.0],
                vec![4.0, 2.0, 0.0, 3.0],
                vec![5.0, 6.0, 3.0, 0.0],
            ],
        )
        .unwrap();
        let mut sol = Solution::from_tour(&inst, vec![0, 2, 1, 3], "manual");
        assert!(SwapSearch::default().improve(&inst, &mut sol));
        assert_eq!(sol.cost, 11.0);
    }

    #[test]
    fn test_infeasible_solution_is_left_alone() {
        let inst = TspInstance::from_matrix("pair", vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let mut sol = Solution::none("none");
        assert!(!SwapSearch::default().improve(&inst, &mut sol));
        assert!(sol.tour.is_empty());
    }
}
