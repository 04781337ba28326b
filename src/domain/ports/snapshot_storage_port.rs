//! Snapshot storage port definition.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::StorageError;

/// Port for namespaced JSON blob persistence.
#[async_trait]
pub trait SnapshotStoragePort: Send + Sync {
    /// Reads the blob stored under `namespace`.
    async fn get(&self, namespace: &str) -> Result<Option<Value>, StorageError>;

    /// Replaces the blob stored under `namespace`.
    async fn set(&self, namespace: &str, blob: Value) -> Result<(), StorageError>;
}
