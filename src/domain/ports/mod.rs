mod chat_data_port;
mod notification_port;
mod snapshot_storage_port;
mod token_storage_port;

pub use chat_data_port::ChatDataPort;
pub use notification_port::NotificationPort;
pub use snapshot_storage_port::SnapshotStoragePort;
pub use token_storage_port::TokenStoragePort;
