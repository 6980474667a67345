//! Error types shared by every model-backed provider.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when calling an embedding or generation provider.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    /// The call did not finish within its time budget.
    #[error("Provider timeout ({provider}) after {after:?}")]
    Timeout {
        /// The provider that timed out.
        provider: String,
        /// The budget that was exceeded.
        after: Duration,
    },

    /// The provider rejected the credentials. Never retried.
    #[error("Provider authentication error ({provider}): {message}")]
    Auth {
        /// The provider that rejected the request.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The provider asked the caller to slow down.
    #[error("Provider rate limited ({provider}): {message}")]
    RateLimited {
        /// The provider that throttled the request.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Network or server-side failure.
    #[error("Provider transport error ({provider}): {message}")]
    Transport {
        /// The provider that failed.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The model answered, but not in the expected schema.
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),
}

impl ModelError {
    /// Whether retrying the same call may succeed.
    ///
    /// Authentication failures and malformed output are never transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ModelError::Timeout { .. } | ModelError::RateLimited { .. } | ModelError::Transport { .. }
        )
    }

    /// Whether this is an authentication failure.
    pub fn is_auth(&self) -> bool {
        matches!(self, ModelError::Auth { .. })
    }

    /// Map a non-success HTTP status onto an error kind.
    pub fn from_http_status(provider: &str, status: u16, detail: impl Into<String>) -> Self {
        let provider = provider.to_string();
        let message = format!("API returned {status}: {}", detail.into());
        match status {
            401 | 403 => ModelError::Auth { provider, message },
            429 => ModelError::RateLimited { provider, message },
            _ => ModelError::Transport { provider, message },
        }
    }
}

/// A convenience result type for provider calls.
pub type Result<T> = std::result::Result<T, ModelError>;
