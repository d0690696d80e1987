//! Error types for the recall engine.

use thiserror::Error;

/// Result type alias using RecallError.
pub type Result<T> = std::result::Result<T, RecallError>;

/// Errors that can occur inside the recall pipeline.
///
/// None of these escape the engine's `invoke` boundary: internal failures
/// are converted into a degraded result envelope before returning.
#[derive(Error, Debug)]
pub enum RecallError {
    /// A retrieval source failed.
    #[error("Source {name} failed: {message}")]
    Source { name: String, message: String },

    /// A retrieval source exceeded the shared deadline.
    #[error("Source {name} timed out after {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },

    /// Embedding error (vector source).
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RecallError {
    /// Create a source failure error.
    pub fn source(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            name: source.into(),
            message: message.into(),
        }
    }

    /// Create a source timeout error.
    pub fn timeout(source: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            name: source.into(),
            timeout_ms,
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
