//! Error types for strawberry-audit.

use thiserror::Error;

/// Result type alias using strawberry-audit's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during an audit.
#[derive(Error, Debug)]
pub enum Error {
    /// Verifier backend failed (transport, HTTP status, malformed body)
    #[error("Verifier error: {backend} - {message}")]
    Verifier { backend: String, message: String },

    /// Timeout during a verifier call
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input could not be loaded
    #[error("Input error: {0}")]
    Input(String),

    /// Batch was cancelled before every claim was scored
    #[error("Audit cancelled after scoring {completed} of {total} claims")]
    Cancelled { completed: usize, total: usize },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a verifier error.
    pub fn verifier(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Verifier {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error should be degraded to a neutral judgment rather
    /// than aborting the run.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::Verifier { .. } | Self::Timeout { .. } | Self::Serialization(_)
        )
    }
}
