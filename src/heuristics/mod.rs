//! Heuristics module.
//!
//! Construction heuristics (one of which seeds the branch-and-bound
//! incumbent) and local search improvement.

pub mod construction;
pub mod local_search;

pub use construction::*;
pub use local_search::*;
