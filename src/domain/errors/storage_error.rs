//! Persistence error types.

use thiserror::Error;

/// Errors raised by snapshot and secret storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode or decode stored data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to access secure storage: {0}")]
    AccessFailed(String),

    #[error("storage backend not available: {0}")]
    NotAvailable(String),
}
