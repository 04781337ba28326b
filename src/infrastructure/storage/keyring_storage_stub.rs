//! Stub keyring storage for builds without keyring support.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::entities::AccessToken;
use crate::domain::errors::StorageError;
use crate::domain::ports::TokenStoragePort;

/// Stub token storage that does nothing.
/// Used when keyring feature is disabled.
pub struct KeyringTokenStorage;

impl KeyringTokenStorage {
    /// Creates new stub storage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for KeyringTokenStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStoragePort for KeyringTokenStorage {
    async fn get_token(&self) -> Result<Option<AccessToken>, StorageError> {
        debug!("Keyring feature disabled - no token storage available");
        Ok(None)
    }

    async fn delete_token(&self) -> Result<(), StorageError> {
        debug!("Keyring feature disabled - cannot delete token");
        Ok(())
    }
}
