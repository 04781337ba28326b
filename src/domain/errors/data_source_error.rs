//! Remote data source error types.

use thiserror::Error;

/// Errors raised by the remote chat/channel data source.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum DataSourceError {
    #[error("access token rejected: {message}")]
    TokenRejected { message: String },

    #[error("network error: {message}")]
    NetworkError { message: String },

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("resource not found: {resource}")]
    NotFound { resource: String },

    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("unexpected data source error: {message}")]
    Unexpected { message: String },
}

impl DataSourceError {
    /// Creates token rejected error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::TokenRejected {
            message: message.into(),
        }
    }

    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates malformed response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Creates unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns whether the next poll may succeed without user action.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::RateLimited { .. } | Self::MalformedResponse { .. }
        )
    }
}
