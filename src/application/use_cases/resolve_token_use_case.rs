//! Token resolution use case.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::dto::{ResolvedToken, TokenSource};
use crate::domain::entities::AccessToken;
use crate::domain::ports::TokenStoragePort;

/// Resolves the access token from available sources.
pub struct ResolveTokenUseCase {
    storage_port: Arc<dyn TokenStoragePort>,
}

impl ResolveTokenUseCase {
    /// Creates new use case.
    #[must_use]
    pub const fn new(storage_port: Arc<dyn TokenStoragePort>) -> Self {
        Self { storage_port }
    }

    /// Resolves token from keyring or CLI/Env.
    ///
    /// Priority:
    /// 1. Keyring
    /// 2. CLI/Env (passed as argument)
    ///
    /// A keyring that cannot be read is treated as empty.
    pub async fn execute(&self, cli_token: Option<String>) -> Option<ResolvedToken> {
        debug!("Checking keyring for stored token");
        match self.storage_port.get_token().await {
            Ok(Some(token)) => {
                info!("Using token from system keyring");
                return Some(ResolvedToken::new(token, TokenSource::Keyring));
            }
            Ok(None) => {
                debug!("No token found in keyring");
            }
            Err(e) => {
                debug!(error = %e, "Failed to check keyring");
            }
        }

        if let Some(token_str) = cli_token.filter(|s| !s.trim().is_empty()) {
            debug!("Checking command-line/env token");
            if let Some(token) = AccessToken::new(token_str) {
                info!("Using token from command line / environment");
                return Some(ResolvedToken::new(token, TokenSource::CommandLine));
            }
            warn!("Command-line token has invalid format");
        }

        debug!("No token found in any source");
        None
    }

    /// Removes any saved token. Failures are logged.
    pub async fn forget(&self) -> bool {
        match self.storage_port.delete_token().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to delete token from keyring");
                false
            }
        }
    }
}
