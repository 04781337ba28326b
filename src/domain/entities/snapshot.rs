//! Persisted unread snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ReadTimestamp;

/// Schema version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Durable subset of unread state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadSnapshot {
    /// Schema version.
    pub version: u32,
    /// Read timestamps by resource key.
    #[serde(default)]
    pub read_timestamps: BTreeMap<String, ReadTimestamp>,
    /// Last observed preview id per chat key.
    #[serde(default)]
    pub last_known_preview_ids: BTreeMap<String, String>,
    /// Last observed message time per channel key.
    #[serde(default)]
    pub channel_last_message_times: BTreeMap<String, String>,
}

impl Default for UnreadSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            read_timestamps: BTreeMap::new(),
            last_known_preview_ids: BTreeMap::new(),
            channel_last_message_times: BTreeMap::new(),
        }
    }
}

impl UnreadSnapshot {
    /// Decodes a stored blob.
    ///
    /// Returns `None` for anything that is not a well-formed snapshot of the
    /// current schema version.
    #[must_use]
    pub fn from_blob(blob: Value) -> Option<Self> {
        match serde_json::from_value::<Self>(blob) {
            Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => Some(snapshot),
            Ok(snapshot) => {
                tracing::debug!(version = snapshot.version, "Ignoring unknown snapshot version");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed snapshot");
                None
            }
        }
    }
}
