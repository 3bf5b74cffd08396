//! Branch-and-Bound TSP Solver Library
//!
//! A time-bounded branch-and-bound solver for the asymmetric Traveling
//! Salesman Problem. Costs may be asymmetric and edges may be missing
//! (infinite cost).
//!
//! # Features
//!
//! - Reduced-cost-matrix lower bounds, recomputed at every search node
//! - Binary-heap node queue ordered by bound per depth or by plain bound
//! - Greedy (nearest neighbor with restarts) incumbent seeding
//! - Anytime behavior: the best tour found so far is returned on timeout
//! - Random and greedy tour construction, swap local search
//! - Random scenario generation, TSP-LIB parsing, benchmarking tools
//!
//! # Example
//!
//! ```no_run
//! use bnb_tsp_solver::instance::TspInstance;
//! use bnb_tsp_solver::exact::{BnbConfig, BranchAndBound};
//!
//! let instance = TspInstance::from_file("instance.tsp").unwrap();
//!
//! let solver = BranchAndBound::new(BnbConfig { time_limit: 30.0, ..Default::default() });
//! let result = solver.solve(&instance).unwrap();
//!
//! if result.is_feasible() {
//!     println!("Tour cost: {:.2}", result.cost);
//! }
//! ```

pub mod benchmark;
pub mod error;
pub mod exact;
pub mod heuristics;
pub mod instance;
pub mod solution;

pub use error::{Result, SolverError};
pub use exact::{solve, BnbConfig, BranchAndBound};
pub use instance::TspInstance;
pub use solution::{SolveResult, Solution};
