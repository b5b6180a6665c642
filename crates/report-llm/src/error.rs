//! Error types for LLM operations

use std::time::Duration;
use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// No model is reachable (not configured, binary missing, ...)
    #[error("Language model unavailable: {0}")]
    Unavailable(String),

    /// The model did not answer in time
    #[error("Language model timed out after {0:?}")]
    Timeout(Duration),

    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error
    #[cfg(feature = "openai")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Provider-specific error
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}
