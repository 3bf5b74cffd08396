//! Search-tree nodes.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use super::matrix::CostMatrix;

/// Key used to order states in the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriorityMetric {
    /// Lower bound divided by depth; favours deep states over shallow cheap-looking ones
    #[default]
    CostPerDepth,
    /// Plain lower bound (uniform-cost order)
    LowerBound,
}

impl PriorityMetric {
    pub fn key(&self, cost: f64, depth: usize) -> f64 {
        match self {
            PriorityMetric::CostPerDepth => cost / depth.max(1) as f64,
            PriorityMetric::LowerBound => cost,
        }
    }
}

/// A partial tour with its private reduced matrix and lower bound.
///
/// Never mutated once built; children get their own matrix copy.
#[derive(Debug, Clone)]
pub struct SearchState {
    /// Cities visited so far, starting with the fixed start city
    pub partial_path: Vec<usize>,
    /// Lower bound on any completion of `partial_path`
    pub cost: f64,
    /// Reduced matrix after every edge of `partial_path` was committed
    pub matrix: CostMatrix,
    /// Cities not yet on the path
    pub candidates: Vec<usize>,
    priority: OrderedFloat<f64>,
}

impl SearchState {
    pub fn new(
        partial_path: Vec<usize>,
        cost: f64,
        matrix: CostMatrix,
        candidates: Vec<usize>,
        metric: PriorityMetric,
    ) -> Self {
        let depth = partial_path.len().saturating_sub(1);
        SearchState {
            priority: OrderedFloat(metric.key(cost, depth)),
            partial_path,
            cost,
            matrix,
            candidates,
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.partial_path.len().saturating_sub(1)
    }

    #[inline]
    pub fn current_city(&self) -> usize {
        self.partial_path[self.partial_path.len() - 1]
    }

    #[inline]
    pub fn priority(&self) -> OrderedFloat<f64> {
        self.priority
    }

    /// All cities are on the path: the state is a complete candidate tour.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::TspInstance;

    #[test]
    fn test_priority_metrics() {
        assert_eq!(PriorityMetric::CostPerDepth.key(12.0, 3), 4.0);
        assert_eq!(PriorityMetric::LowerBound.key(12.0, 3), 12.0);
        assert_eq!(PriorityMetric::default(), PriorityMetric::CostPerDepth);
    }

    #[test]
    fn test_state_accessors() {
        let inst = TspInstance::from_matrix("s", vec![vec![0.0; 3]; 3]).unwrap();
        let state = SearchState::new(
            vec![0, 2],
            6.0,
            CostMatrix::from_instance(&inst),
            vec![1],
            PriorityMetric::CostPerDepth,
        );
        assert_eq!(state.depth(), 1);
        assert_eq!(state.current_city(), 2);
        assert_eq!(state.priority(), OrderedFloat(6.0));
        assert!(!state.is_leaf());
    }
}
