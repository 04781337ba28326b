//! Conversation and channel facts consumed by unread tracking.

use serde::{Deserialize, Serialize};

/// Summary of the most recent message in a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePreview {
    /// Message id.
    pub id: String,
    /// ISO-8601 creation time.
    pub created_at: String,
    /// Author user id, if the sender is a user.
    pub author_id: Option<String>,
}

impl MessagePreview {
    /// Creates a new preview.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        created_at: impl Into<String>,
        author_id: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            created_at: created_at.into(),
            author_id,
        }
    }
}

/// A chat as returned by the conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    /// Chat id.
    pub id: String,
    /// Latest message, absent for empty chats.
    pub last_message_preview: Option<MessagePreview>,
    /// Server-side last read time for the current user.
    pub server_last_read: Option<String>,
}

impl ChatSummary {
    /// Creates a chat with no preview and no server read marker.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            last_message_preview: None,
            server_last_read: None,
        }
    }

    /// Sets the latest message preview.
    #[must_use]
    pub fn with_preview(mut self, preview: MessagePreview) -> Self {
        self.last_message_preview = Some(preview);
        self
    }

    /// Sets the server-reported last read time.
    #[must_use]
    pub fn with_server_last_read(mut self, timestamp: impl Into<String>) -> Self {
        self.server_last_read = Some(timestamp.into());
        self
    }
}

/// Result of peeking at the newest message in a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPeek {
    /// ISO-8601 creation time of the newest message.
    pub created_at: String,
    /// Sender user id, if any.
    pub from_user_id: Option<String>,
}

impl ChannelPeek {
    /// Creates a new peek result.
    #[must_use]
    pub fn new(created_at: impl Into<String>, from_user_id: Option<String>) -> Self {
        Self {
            created_at: created_at.into(),
            from_user_id,
        }
    }
}

/// A channel the poller keeps an eye on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchedChannel {
    /// Owning team id.
    pub team_id: String,
    /// Channel id.
    pub channel_id: String,
}

impl WatchedChannel {
    /// Creates a watched channel reference.
    #[must_use]
    pub fn new(team_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            channel_id: channel_id.into(),
        }
    }
}
