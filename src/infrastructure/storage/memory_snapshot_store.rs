//! Process-local snapshot storage.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::domain::errors::StorageError;
use crate::domain::ports::SnapshotStoragePort;

/// Keeps blobs in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    blobs: RwLock<HashMap<String, Value>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStoragePort for MemorySnapshotStore {
    async fn get(&self, namespace: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.blobs.read().get(namespace).cloned())
    }

    async fn set(&self, namespace: &str, blob: Value) -> Result<(), StorageError> {
        self.blobs.write().insert(namespace.to_string(), blob);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemorySnapshotStore::new();
        assert!(store.get("sections").await.unwrap().is_none());

        store.set("sections", json!({ "sections": [] })).await.unwrap();

        assert_eq!(
            store.get("sections").await.unwrap(),
            Some(json!({ "sections": [] }))
        );
        assert!(store.get("readState").await.unwrap().is_none());
    }
}
