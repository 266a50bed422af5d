//! Error types for the pricing engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    /// An operating parameter would make the pipeline divide by zero or
    /// is outside its accepted range.
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// A cost line item is negative or implausibly large.
    #[error("invalid cost: {field} {reason}")]
    InvalidCost { field: &'static str, reason: String },

    #[error("missing or invalid credentials")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for PricingError {
    fn from(err: std::io::Error) -> Self {
        PricingError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for PricingError {
    fn from(err: serde_json::Error) -> Self {
        PricingError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PricingError>;
