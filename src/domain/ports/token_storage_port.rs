//! Token storage port definition.

use async_trait::async_trait;

use crate::domain::entities::AccessToken;
use crate::domain::errors::StorageError;

/// Port for access token persistence operations.
#[async_trait]
pub trait TokenStoragePort: Send + Sync {
    /// Retrieves stored token.
    async fn get_token(&self) -> Result<Option<AccessToken>, StorageError>;

    /// Deletes stored token.
    async fn delete_token(&self) -> Result<(), StorageError>;

    /// Checks if token exists.
    async fn has_token(&self) -> Result<bool, StorageError> {
        Ok(self.get_token().await?.is_some())
    }
}
