//! Branch-and-bound search over reduced cost matrices.
//!
//! The search starts from a greedy incumbent, seeds the queue with every
//! first edge out of city 0, then repeatedly pops the state with the lowest
//! priority, discards it if the incumbent has overtaken its bound, records it
//! if it is a complete tour, and otherwise pushes every child whose bound
//! still beats the incumbent. The time budget is polled once per popped state.

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::incumbent::Incumbent;
use super::matrix::CostMatrix;
use super::queue::StateHeap;
use super::state::{PriorityMetric, SearchState};
use crate::error::{Result, SolverError};
use crate::heuristics::construction::{GreedyTour, TourConstructor};
use crate::instance::TspInstance;
use crate::solution::{SearchStats, SolveResult, Termination};

/// City every partial path starts from
const START_CITY: usize = 0;

/// Branch-and-bound configuration
#[derive(Debug, Clone)]
pub struct BnbConfig {
    /// Search budget in seconds, measured from the start of `solve`
    pub time_limit: f64,
    /// Queue ordering
    pub priority: PriorityMetric,
    /// Seed of the RNG handed to the greedy seeding pass
    pub seed: u64,
    /// Sub-budget for greedy restarts; the first greedy walk always completes
    pub greedy_time_limit: f64,
    /// Maximum greedy restarts after the first walk
    pub greedy_max_restarts: usize,
}

impl Default for BnbConfig {
    fn default() -> Self {
        BnbConfig {
            time_limit: 60.0,
            priority: PriorityMetric::CostPerDepth,
            seed: 42,
            greedy_time_limit: 1.0,
            greedy_max_restarts: 100,
        }
    }
}

pub struct BranchAndBound {
    pub config: BnbConfig,
}

impl BranchAndBound {
    pub fn new(config: BnbConfig) -> Self {
        BranchAndBound { config }
    }

    pub fn with_time_limit(time_limit: f64) -> Self {
        BranchAndBound {
            config: BnbConfig {
                time_limit,
                ..Default::default()
            },
        }
    }

    /// Find the cheapest tour reachable within the time budget.
    ///
    /// Only an instance without cities is an error. Infeasible instances come
    /// back with infinite cost and an empty route.
    pub fn solve(&self, instance: &TspInstance) -> Result<SolveResult> {
        let started = Instant::now();
        let n = instance.dimension;
        let metric = self.config.priority;

        if n == 0 || instance.cost_matrix.len() != n {
            return Err(SolverError::invalid_input("instance has no cities"));
        }
        if n == 1 {
            return Ok(SolveResult {
                cost: 0.0,
                route: vec![START_CITY],
                elapsed: started.elapsed().as_secs_f64(),
                initial_cost: 0.0,
                termination: Termination::Trivial,
                priority: metric,
                stats: SearchStats::default(),
                history: vec![(0.0, 0.0)],
            });
        }

        // Seeding
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let greedy = GreedyTour::new(self.config.greedy_time_limit, self.config.greedy_max_restarts)
            .construct(instance, &mut rng);
        let initial_cost = greedy.cost;
        let mut incumbent = Incumbent::new(greedy.rotated_to(START_CITY), greedy.cost, started);
        if greedy.feasible {
            log::debug!("Greedy seed cost {:.2} after {:?} attempts", greedy.cost, greedy.iterations);
        } else {
            log::debug!("Greedy seed failed; searching without an upper bound");
        }

        let mut stats = SearchStats::default();
        let mut queue = StateHeap::new();
        let root = root_state(instance, metric);
        self.expand(&root, &incumbent, &mut queue, &mut stats);
        log::debug!("Seeded queue with {} first-edge states", queue.len());

        // Exploring
        let termination = loop {
            if queue.is_empty() {
                break Termination::Exhausted;
            }
            if started.elapsed().as_secs_f64() >= self.config.time_limit {
                break Termination::TimedOut;
            }
            let Some(state) = queue.delete_min() else {
                break Termination::Exhausted;
            };

            if !incumbent.admits(state.cost) {
                stats.states_pruned += 1;
                log::trace!("Pruned {:?} (bound {:.2})", state.partial_path, state.cost);
                continue;
            }
            stats.states_expanded += 1;

            if state.is_leaf() {
                stats.leaves_found += 1;
                let cost = instance.tour_cost(&state.partial_path);
                if incumbent.offer(&state.partial_path, cost, started) {
                    log::info!(
                        "New best tour: cost {:.2} after {:.3}s ({} states expanded)",
                        cost,
                        started.elapsed().as_secs_f64(),
                        stats.states_expanded
                    );
                }
                continue;
            }

            self.expand(&state, &incumbent, &mut queue, &mut stats);
        };

        stats.remaining_queue = queue.len();
        let elapsed = started.elapsed().as_secs_f64();
        let history = incumbent.history().to_vec();
        let (route, cost) = incumbent.into_parts();

        log::info!(
            "Branch and bound {:?}: cost {:.2}, {} expanded, {} pruned, max queue {}, {:.3}s",
            termination,
            cost,
            stats.states_expanded,
            stats.states_pruned,
            stats.max_queue_size,
            elapsed
        );

        Ok(SolveResult {
            cost,
            route,
            elapsed,
            initial_cost,
            termination,
            priority: metric,
            stats,
            history,
        })
    }

    /// Push every child of `state` whose bound beats the incumbent.
    fn expand(
        &self,
        state: &SearchState,
        incumbent: &Incumbent,
        queue: &mut StateHeap,
        stats: &mut SearchStats,
    ) {
        for &city in &state.candidates {
            match child_state(state, city, incumbent.cost(), self.config.priority) {
                Some(child) => {
                    queue.insert(child);
                    stats.states_created += 1;
                    stats.max_queue_size = stats.max_queue_size.max(queue.len());
                }
                None => stats.states_pruned += 1,
            }
        }
    }
}

/// Zero-edge state at the start city: unreduced root matrix, bound zero.
pub(crate) fn root_state(instance: &TspInstance, metric: PriorityMetric) -> SearchState {
    let candidates = (0..instance.dimension).filter(|&c| c != START_CITY).collect();
    SearchState::new(
        vec![START_CITY],
        0.0,
        CostMatrix::from_instance(instance),
        candidates,
        metric,
    )
}

/// Extend `parent` to `city`, or `None` when the child cannot beat `upper_bound`.
///
/// The matrix copy is only made once the edge exists and the parent bound plus
/// the edge cost still leaves room below `upper_bound`.
pub(crate) fn child_state(
    parent: &SearchState,
    city: usize,
    upper_bound: f64,
    metric: PriorityMetric,
) -> Option<SearchState> {
    let from = parent.current_city();
    let edge = parent.matrix.get(from, city);
    if !edge.is_finite() || parent.cost + edge >= upper_bound {
        return None;
    }

    let (matrix, bound) = parent.matrix.reduce(from, city, parent.cost);
    if bound >= upper_bound {
        return None;
    }

    let mut path = Vec::with_capacity(parent.partial_path.len() + 1);
    path.extend_from_slice(&parent.partial_path);
    path.push(city);
    let candidates = parent.candidates.iter().copied().filter(|&c| c != city).collect();
    Some(SearchState::new(path, bound, matrix, candidates, metric))
}

/// Solve with default settings and the given time limit in seconds.
pub fn solve(instance: &TspInstance, time_limit: f64) -> Result<SolveResult> {
    BranchAndBound::with_time_limit(time_limit).solve(instance)
}
