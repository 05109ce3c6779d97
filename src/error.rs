//! Error types for input validation.
//!
//! Infeasible packing is not an error; it is reported through `Option` results
//! and `PackingFailure` values.

use thiserror::Error;

/// Validation error for item, box and parameter data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Invalid cost: {0}")]
    InvalidCost(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Validates a single dimension.
pub(crate) fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Validates a strictly positive weight.
pub(crate) fn validate_weight(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidWeight(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}
