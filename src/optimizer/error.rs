use thiserror::Error;

/// Failure conditions inside the optimizer. All of these are caught at the
/// public entry point and folded into an [`super::types::OptimizationResult`];
/// none escape to the caller as an `Err`.
#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("No funds found matching criteria")]
    NoFundsFound,

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("solver failed to converge: {0}")]
    SolverNonConvergence(String),
}
