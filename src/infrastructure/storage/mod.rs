//! Snapshot and token storage adapters.

mod file_snapshot_store;
#[cfg(feature = "keyring")]
mod keyring_storage;
#[cfg(not(feature = "keyring"))]
mod keyring_storage_stub;
mod memory_snapshot_store;

pub use file_snapshot_store::{FileSnapshotStore, SECTIONS_FILE, UNREAD_STATE_FILE};
#[cfg(feature = "keyring")]
pub use keyring_storage::KeyringTokenStorage;
#[cfg(not(feature = "keyring"))]
pub use keyring_storage_stub::KeyringTokenStorage;
pub use memory_snapshot_store::MemorySnapshotStore;
