//! Token DTOs.

use crate::domain::entities::AccessToken;

/// Where the access token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Token from system keyring.
    Keyring,
    /// Token from the command line or environment.
    CommandLine,
}

impl TokenSource {
    /// Returns human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Keyring => "system keyring",
            Self::CommandLine => "command line / environment",
        }
    }
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Resolved token with its source.
#[derive(Debug, Clone)]
pub struct ResolvedToken {
    /// The access token.
    pub token: AccessToken,
    /// Source of the token.
    pub source: TokenSource,
}

impl ResolvedToken {
    /// Creates new resolved token.
    #[must_use]
    pub const fn new(token: AccessToken, source: TokenSource) -> Self {
        Self { token, source }
    }
}
