//! Error types for PensionBot
//!
//! Every external call (embedding, index, completion) funnels its failures
//! through `BotError` so callers can tell a transient outage from a
//! permanent misconfiguration.

use thiserror::Error;

/// Main error type for the PensionBot chat system
#[derive(Error, Debug)]
pub enum BotError {
    /// HTTP transport errors (connection refused, TLS, body decode)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status returned by an external service
    #[error("{service} API error (HTTP {status}): {body}")]
    Api {
        service: String,
        status: u16,
        body: String,
    },

    /// Response arrived but did not have the expected shape
    #[error("Invalid response from {service}: {reason}")]
    InvalidResponse { service: String, reason: String },

    /// Required credential is not configured
    #[error("Missing API key: set {0}")]
    MissingApiKey(String),

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Retry budget exhausted on a transient failure
    #[error("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<BotError> },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

impl BotError {
    /// Build an `Api` error from a service name, status code and body
    pub fn api(service: &str, status: reqwest::StatusCode, body: String) -> Self {
        BotError::Api {
            service: service.to_string(),
            status: status.as_u16(),
            body,
        }
    }

    /// Build an `InvalidResponse` error
    pub fn invalid_response(service: &str, reason: impl Into<String>) -> Self {
        BotError::InvalidResponse {
            service: service.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the request ran out of time rather than being refused
    pub fn is_timeout(&self) -> bool {
        match self {
            BotError::Timeout { .. } => true,
            BotError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            BotError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            BotError::Timeout { .. } => true,
            // 429 is rate limiting, 5xx is the service's own trouble
            BotError::Api { status, .. } => *status == 429 || *status >= 500,
            BotError::InvalidResponse { .. }
            | BotError::MissingApiKey(_)
            | BotError::RetriesExhausted { .. }
            | BotError::Config(_)
            | BotError::Serialization(_)
            | BotError::Io(_)
            | BotError::Generic(_) => false,
        }
    }
}

/// Result type alias for PensionBot operations
pub type Result<T> = std::result::Result<T, BotError>;

/// Convert anyhow errors to BotError
impl From<anyhow::Error> for BotError {
    fn from(err: anyhow::Error) -> Self {
        BotError::Generic(err.to_string())
    }
}
