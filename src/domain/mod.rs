//! Domain layer with core entities, reconciliation rules and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Reconciliation and grouping rules.
pub mod services;

pub use entities::{ResourceKey, ResourceKind, SectionItem};
pub use errors::{DataSourceError, StorageError};
pub use ports::{ChatDataPort, NotificationPort, SnapshotStoragePort, TokenStoragePort};
pub use services::{SectionLayout, UnreadLedger};
