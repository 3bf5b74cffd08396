//! Error type shared by instance loading and the solvers.
//!
//! Only malformed input is an error. Ordinary search outcomes (pruning,
//! exhaustion, timeout, infeasible instances) are reported through
//! [`crate::solution::SolveResult`] instead.

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SolverError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, SolverError>;

impl SolverError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
