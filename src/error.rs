//! Error types for the pricing engine

use thiserror::Error;

/// Errors raised while building assumptions or aggregating results
///
/// Solver non-convergence is not an error; see `SolverOutcome::converged`.
#[derive(Debug, Error)]
pub enum PricingError {
    /// A scalar assumption is outside its valid range
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A distribution could not be constructed from its parameters
    #[error("invalid {name} distribution: {reason}")]
    InvalidDistribution { name: &'static str, reason: String },

    /// Claim severity probabilities are malformed
    #[error("invalid claim severity distribution: {0}")]
    InvalidSeverity(String),

    /// Risk metrics requested over zero simulated policies
    #[error("cannot compute risk metrics over an empty sample")]
    EmptySample,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PricingError>;
