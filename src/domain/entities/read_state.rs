//! Read state entities.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Where a read timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadSource {
    /// Reported by the remote API.
    Server,
    /// Recorded by this client.
    Local,
}

/// Point up to which the user is caught up on a resource.
///
/// Timestamps are fixed-width ISO-8601 UTC strings, so they order
/// lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadTimestamp {
    /// ISO-8601 UTC timestamp.
    pub timestamp: String,
    /// Origin of the timestamp.
    pub source: ReadSource,
}

impl ReadTimestamp {
    /// Creates a locally recorded read timestamp.
    #[must_use]
    pub fn local(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            source: ReadSource::Local,
        }
    }

    /// Creates a server-reported read timestamp.
    #[must_use]
    pub fn server(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            source: ReadSource::Server,
        }
    }
}

/// Formats a UTC instant the way read timestamps are stored
/// (`2026-02-28T12:00:00.000Z`).
#[must_use]
pub fn iso_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Returns the current time as a read timestamp string.
#[must_use]
pub fn iso_now() -> String {
    iso_timestamp(Utc::now())
}
