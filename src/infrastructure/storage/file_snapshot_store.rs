//! JSON file snapshot storage.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::errors::StorageError;
use crate::domain::ports::SnapshotStoragePort;

/// File backing the unread snapshot.
pub const UNREAD_STATE_FILE: &str = "unread-state.json";
/// File backing the section overlay.
pub const SECTIONS_FILE: &str = "sections.json";

/// Stores namespaced blobs as one JSON object in a single file.
///
/// Writes go through a temporary file in the same directory and are renamed
/// into place, so readers never observe a half-written file.
pub struct FileSnapshotStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSnapshotStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a store for `file_name` inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path, file_name: &str) -> Self {
        Self::new(dir.join(file_name))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, StorageError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => {
                warn!(path = %self.path.display(), "Snapshot file is not a JSON object, ignoring");
                Ok(Map::new())
            }
        }
    }

    fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StorageError> {
        let parent = path
            .parent()
            .ok_or_else(|| std::io::Error::other("Invalid path"))?;
        std::fs::create_dir_all(parent)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(content)?;
        temp_file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStoragePort for FileSnapshotStore {
    async fn get(&self, namespace: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.read_all().await?.remove(namespace))
    }

    async fn set(&self, namespace: &str, blob: Value) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = match self.read_all().await {
            Ok(entries) => entries,
            Err(StorageError::Serialization(e)) => {
                warn!(path = %self.path.display(), error = %e, "Replacing unreadable snapshot file");
                Map::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(namespace.to_string(), blob);

        let content = serde_json::to_vec_pretty(&Value::Object(entries))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::write_atomic(&path, &content))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        debug!(path = %self.path.display(), namespace, "Snapshot written");
        Ok(())
    }
}
