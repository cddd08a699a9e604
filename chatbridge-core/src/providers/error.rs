//! Provider error types and handling

use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur when interacting with model providers
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Authentication failed or credentials missing
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Provider returned a non-success status
    #[error("Provider error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Timeout occurred
    #[error("Request timed out")]
    Timeout,

    /// Response parsing error
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The event stream broke off mid-response
    #[error("Stream error: {0}")]
    Stream(String),

    /// No model registered under a logical name
    #[error("No such {kind} model: {name}")]
    NoSuchModel { kind: ModelKind, name: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Kind of model a registry lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Language,
    Image,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Language => write!(f, "language"),
            ModelKind::Image => write!(f, "image"),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_connect() {
            ProviderError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            ProviderError::ParseError(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::ParseError(err.to_string())
    }
}
