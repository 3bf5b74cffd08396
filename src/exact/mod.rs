//! Exact solvers module.
//!
//! Branch-and-bound over reduced cost matrices, anytime under a time budget.

mod branch_and_bound;
mod incumbent;
pub mod matrix;
mod queue;
mod state;

pub use branch_and_bound::{solve, BnbConfig, BranchAndBound};
pub use incumbent::Incumbent;
pub use matrix::CostMatrix;
pub use queue::StateHeap;
pub use state::{PriorityMetric, SearchState};
