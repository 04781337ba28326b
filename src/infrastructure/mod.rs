//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Microsoft Graph client.
pub mod graph;
/// System notifications.
pub mod notifications;
/// Snapshot and token storage adapters.
pub mod storage;

pub use config::{AppConfig, CliArgs, ConfigError, LogLevel, StorageBackend, StorageManager};
pub use graph::GraphClient;
pub use notifications::{DesktopNotificationService, LogNotificationService};
pub use storage::{
    FileSnapshotStore, KeyringTokenStorage, MemorySnapshotStore, SECTIONS_FILE, UNREAD_STATE_FILE,
};
