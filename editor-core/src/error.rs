//! Error types for document operations.

use thiserror::Error;

/// Result type for document operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in document operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Element not found in the design.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Element id could not be parsed.
    #[error("Invalid element id: {0}")]
    InvalidId(String),

    /// Invalid element operation.
    #[error("Invalid operation on element: {0}")]
    InvalidOperation(String),

    /// Design serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing a saved design failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
