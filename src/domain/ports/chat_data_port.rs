//! Remote chat data port.

use async_trait::async_trait;

use crate::domain::entities::{ChannelPeek, ChatSummary};
use crate::domain::errors::DataSourceError;

/// Port for the remote conversation and channel source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatDataPort: Send + Sync {
    /// Fetches the signed-in user's id.
    async fn fetch_current_user_id(&self) -> Result<String, DataSourceError>;

    /// Fetches the current page of conversations with their latest previews.
    async fn fetch_chats(&self) -> Result<Vec<ChatSummary>, DataSourceError>;

    /// Fetches a single conversation by id.
    ///
    /// Used for conversations the user keeps in a section that fall outside
    /// the current page. Returns `None` for a conversation hidden by the user.
    async fn fetch_chat(&self, chat_id: &str) -> Result<Option<ChatSummary>, DataSourceError>;

    /// Peeks at the newest plain message of a channel.
    ///
    /// Returns `None` when the channel is empty or its newest item is not a
    /// regular message.
    async fn peek_channel_latest_message(
        &self,
        team_id: &str,
        channel_id: &str,
    ) -> Result<Option<ChannelPeek>, DataSourceError>;

    /// Marks a chat as read for the given user on the server.
    async fn mark_chat_read(&self, chat_id: &str, user_id: &str) -> Result<(), DataSourceError>;

    /// Marks a channel as read on the server.
    ///
    /// Sources without a server-side channel read marker accept this as a
    /// no-op.
    async fn mark_channel_read(
        &self,
        team_id: &str,
        channel_id: &str,
    ) -> Result<(), DataSourceError> {
        tracing::debug!(team_id, channel_id, "Channel read marker kept local");
        Ok(())
    }
}
