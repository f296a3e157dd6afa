//! Error types for the tree crate.

use thiserror::Error;

/// Errors from building or querying the KD-trees and cluster types.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A slice did not have one entry per dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A configuration or argument value was outside its valid domain
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A coordinate was NaN or infinite
    #[error("Non-finite location: {location:?}")]
    NonFiniteLocation { location: Vec<f64> },
}

impl TreeError {
    /// Create an InvalidArgument error with a message
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn non_finite(location: &[f64]) -> Self {
        Self::NonFiniteLocation {
            location: location.to_vec(),
        }
    }
}

// Type alias for Result using TreeError
pub type Result<T> = std::result::Result<T, TreeError>;
