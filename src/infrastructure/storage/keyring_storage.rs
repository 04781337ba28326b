//! Keyring-based token storage.

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use crate::domain::entities::AccessToken;
use crate::domain::errors::StorageError;
use crate::domain::ports::TokenStoragePort;

const KEYRING_SERVICE: &str = "teamy";
const KEYRING_USER: &str = "graph-token";

/// System keyring token storage adapter.
pub struct KeyringTokenStorage {
    service: String,
    user: String,
}

impl KeyringTokenStorage {
    /// Creates new storage with default names.
    #[must_use]
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
            user: KEYRING_USER.to_string(),
        }
    }

    /// Creates storage with custom names.
    #[must_use]
    pub fn with_names(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }

    fn entry(&self) -> Result<Entry, StorageError> {
        Entry::new(&self.service, &self.user).map_err(|e| StorageError::AccessFailed(e.to_string()))
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
        debug!(service = %self.service, "Retrieving token from keyring");

        let entry = self.entry()?;

        match entry.get_password() {
            Ok(password) => {
                let token = AccessToken::new(password);
                if token.is_none() {
                    warn!("Ignoring malformed token stored in keyring");
                }
                Ok(token)
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No token stored in keyring");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Failed to retrieve token from keyring");
                Err(StorageError::AccessFailed(e.to_string()))
            }
        }
    }

    async fn delete_token(&self) -> Result<(), StorageError> {
        debug!(service = %self.service, "Deleting token from keyring");

        let entry = self.entry()?;

        match entry.delete_credential() {
            Ok(()) => {
                debug!("Token deleted from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No token to delete");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to delete token from keyring");
                Err(StorageError::AccessFailed(e.to_string()))
            }
        }
    }
}
