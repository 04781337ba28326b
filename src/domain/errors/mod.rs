//! Domain error types.

mod data_source_error;
mod storage_error;

pub use data_source_error::DataSourceError;
pub use storage_error::StorageError;
