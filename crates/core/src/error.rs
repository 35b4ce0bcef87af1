//! Error types shared by the Recall services.

use thiserror::Error;

/// Errors raised by the core library.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Not found error
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Encryption error
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),

    /// A provider API answered with an error
    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },

    /// NATS messaging error
    #[error("Queue error: {0}")]
    Queue(String),

    /// Text extraction error (PDF, encoding)
    #[error("Extraction error: {0}")]
    Extraction(String),
}

impl CoreError {
    /// Build a provider error.
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        CoreError::Provider {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        CoreError::Http(err.to_string())
    }
}

impl From<envy::Error> for CoreError {
    fn from(err: envy::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}
