use crate::symbolic::parse_expr::ParseError;
use crate::symbolic::symbolic_integration::IntegrationError;
use crate::symbolic::symbolic_lambdify::EvaluationError;
use thiserror::Error;

/// Bounds rejected before any parsing or integration is attempted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{variable}: maximum {max} must exceed minimum {min}")]
    EmptyInterval { variable: String, min: f64, max: f64 },
    #[error("{variable}: bound {value} is not a finite number")]
    NonFiniteBound { variable: String, value: f64 },
}

/// Error type of every public calculator operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("Invalid bounds: {0}")]
    Validation(#[from] ValidationError),
    #[error("Could not parse the function: {0}")]
    Parse(#[from] ParseError),
    #[error("Error evaluating the function: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error("Error during calculation: {0}")]
    Integration(#[from] IntegrationError),
}
