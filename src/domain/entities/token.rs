//! Graph access token value object.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Bearer token for the collaboration API, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AccessToken {
    value: String,
}

impl AccessToken {
    const MIN_TOKEN_LENGTH: usize = 16;

    /// Creates a token, rejecting empty or obviously malformed values.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let mut raw = value.into();
        let trimmed = raw.trim().to_string();
        raw.zeroize();

        if trimmed.len() < Self::MIN_TOKEN_LENGTH || trimmed.chars().any(char::is_whitespace) {
            return None;
        }

        Some(Self { value: trimmed })
    }

    /// Creates token without validation.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Returns token as string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns masked token for display.
    #[must_use]
    pub fn masked(&self) -> String {
        let char_count = self.value.chars().count();
        if char_count <= 10 {
            return "*".repeat(char_count);
        }

        let visible_prefix: String = self.value.chars().take(4).collect();
        let visible_suffix: String = self.value.chars().skip(char_count - 4).collect();
        format!("{visible_prefix}...{visible_suffix}")
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &self.masked())
            .finish()
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}
