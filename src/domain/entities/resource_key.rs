//! Resource keys for unread tracking.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of trackable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Direct or group conversation.
    Chat,
    /// Channel inside a team.
    Channel,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => write!(f, "chat"),
            Self::Channel => write!(f, "channel"),
        }
    }
}

/// Identifies a conversation or a team channel.
///
/// Channel ids are only unique within their team, so channels are keyed on
/// the `teamId:channelId` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// A chat, keyed by its id.
    Chat {
        /// Chat id.
        id: String,
    },
    /// A channel, keyed by team and channel id.
    Channel {
        /// Owning team id.
        team_id: String,
        /// Channel id.
        channel_id: String,
    },
}

impl ResourceKey {
    /// Creates a chat key.
    #[must_use]
    pub fn chat(id: impl Into<String>) -> Self {
        Self::Chat { id: id.into() }
    }

    /// Creates a channel key.
    #[must_use]
    pub fn channel(team_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self::Channel {
            team_id: team_id.into(),
            channel_id: channel_id.into(),
        }
    }

    /// Returns the resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Chat { .. } => ResourceKind::Chat,
            Self::Channel { .. } => ResourceKind::Channel,
        }
    }

    /// Returns the flat key used for storage and lookup.
    #[must_use]
    pub fn storage_key(&self) -> String {
        match self {
            Self::Chat { id } => id.clone(),
            Self::Channel {
                team_id,
                channel_id,
            } => format!("{team_id}:{channel_id}"),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat { id } => write!(f, "{id}"),
            Self::Channel {
                team_id,
                channel_id,
            } => write!(f, "{team_id}:{channel_id}"),
        }
    }
}
