//! Completion failure taxonomy.

use std::time::Duration;

use thiserror::Error;

/// Why a completion could not be produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// HTTP 429. `retry_after` comes from the `Retry-After` header when present.
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// HTTP 401/403. Fatal for the process.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Transport failure, timeout, or a transient server-side status.
    #[error("network error: {0}")]
    Network(String),

    /// The request was rejected as malformed or unprocessable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl CompletionError {
    /// True for failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionError::RateLimited { .. } | CompletionError::Network(_)
        )
    }

    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, message: String, retry_after: Option<Duration>) -> Self {
        match status {
            429 => CompletionError::RateLimited { retry_after },
            401 | 403 => CompletionError::Auth(message),
            408 | 409 | 500..=599 => CompletionError::Network(format!("HTTP {}: {}", status, message)),
            _ => CompletionError::InvalidRequest(format!("HTTP {}: {}", status, message)),
        }
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return CompletionError::from_status(status.as_u16(), err.to_string(), None);
        }
        if err.is_builder() {
            return CompletionError::InvalidRequest(err.to_string());
        }
        CompletionError::Network(err.to_string())
    }
}
