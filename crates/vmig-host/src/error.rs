//! Hosting API error types.

use thiserror::Error;

/// Result type for hosting API operations.
pub type HostResult<T> = Result<T, HostError>;

/// Back-off used for a 429 without a usable `Retry-After` header.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// Errors that can occur while talking to the hosting service.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Request rejected ({0}): {1}")]
    ClientError(u16, String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify a non-success HTTP status.
    pub fn from_http_status(status: u16, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match status {
            401 | 403 => Self::AuthError(msg),
            404 | 410 => Self::NotFound(msg),
            409 => Self::Conflict(msg),
            429 => Self::RateLimited(DEFAULT_RATE_LIMIT_MS),
            500..=599 => Self::ServerError(status, msg),
            _ => Self::ClientError(status, msg),
        }
    }

    /// HTTP status this error corresponds to, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            HostError::AuthError(_) => Some(401),
            HostError::NotFound(_) => Some(404),
            HostError::Conflict(_) => Some(409),
            HostError::ClientError(status, _) | HostError::ServerError(status, _) => Some(*status),
            HostError::RateLimited(_) => Some(429),
            HostError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Delay requested by the server, for rate limiting.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            HostError::RateLimited(ms) if *ms > 0 => Some(*ms),
            _ => None,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            HostError::Network(e) => !e.is_builder() && !e.is_decode(),
            HostError::RateLimited(_) | HostError::ServerError(_, _) => true,
            _ => false,
        }
    }
}
