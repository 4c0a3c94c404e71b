//! Error types for the request tracking core.

use thiserror::Error;

use crate::batch::BatchId;
use crate::request::RequestId;

/// Result type alias using the crate error type.
pub type Result<T> = std::result::Result<T, IibError>;

/// Main error type for the request tracking core.
#[derive(Error, Debug)]
pub enum IibError {
    /// Validation error (invalid state name, illegal transition, malformed input).
    ///
    /// The message is surfaced verbatim; callers match on its content.
    #[error("{0}")]
    ValidationError(String),

    /// Request not found
    #[error("Request not found: {0}")]
    RequestNotFound(RequestId),

    /// Batch not found
    #[error("Batch not found: {0}")]
    BatchNotFound(BatchId),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error from anyhow
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IibError {
    /// Shorthand for building a [`IibError::ValidationError`].
    pub fn validation(message: impl Into<String>) -> Self {
        IibError::ValidationError(message.into())
    }

    /// Returns true if this error was raised by input or state-machine validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, IibError::ValidationError(_))
    }
}
