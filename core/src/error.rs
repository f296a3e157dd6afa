//! Error types for the core utilities.
//!
//! This module defines `GdscError`, the single error type returned by the fallible
//! operations in this crate. It uses `thiserror` for construction and carries enough
//! context to tell which argument or input was rejected.

use thiserror::Error;

/// Custom error type for core utility operations.
///
/// Argument validation failures (bad radius, mismatched image dimensions, sampling
/// more values than exist) are reported through this type rather than by panicking.
#[derive(Debug, Error)]
pub enum GdscError {
    /// An argument was outside its valid domain
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Not enough data to compute the requested quantity
    #[error("Insufficient data: need at least {min} values, got {actual}")]
    InsufficientData { min: usize, actual: usize },

    /// Two sizes that must agree did not
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// File system failures from the file helpers
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML passed to the formatter
    #[error("XML error: {message}")]
    Xml { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GdscError {
    /// Create an InvalidArgument error with a message
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an InsufficientData error
    pub fn insufficient_data(min: usize, actual: usize) -> Self {
        Self::InsufficientData { min, actual }
    }

    /// Create a DimensionMismatch error
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create an Xml error with a message
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml {
            message: message.into(),
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        match self {
            Self::InvalidArgument { message } => Self::InvalidArgument {
                message: format!("{}: {}", context.into(), message),
            },
            Self::Xml { message } => Self::Xml {
                message: format!("{}: {}", context.into(), message),
            },
            Self::Io(e) => Self::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", context.into(), e),
            )),
            other => other,
        }
    }
}

impl From<quick_xml::Error> for GdscError {
    fn from(err: quick_xml::Error) -> Self {
        Self::xml(err.to_string())
    }
}

// Type alias for Result using GdscError
pub type Result<T> = std::result::Result<T, GdscError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let err = GdscError::invalid_argument("radius must be positive");
        assert_eq!(err.to_string(), "Invalid argument: radius must be positive");
    }

    #[test]
    fn test_with_context_prefixes_message() {
        let err = GdscError::invalid_argument("k > n").with_context("sample");
        assert_eq!(err.to_string(), "Invalid argument: sample: k > n");
    }

    #[test]
    fn test_with_context_keeps_counts() {
        let err = GdscError::insufficient_data(9, 4).with_context("noise");
        assert!(matches!(
            err,
            GdscError::InsufficientData { min: 9, actual: 4 }
        ));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: GdscError = io.into();
        assert!(err.to_string().contains("missing"));
    }
}
