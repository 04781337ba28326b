use serde::{Deserialize, Serialize};

use crate::domain::entities::{ChannelPeek, ChatSummary, MessagePreview};

/// One page of a Graph collection.
#[derive(Debug, Deserialize)]
pub struct PageResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// `GET /me` response.
#[derive(Debug, Deserialize)]
pub struct MeResponse {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct IdentitySet {
    pub user: Option<Identity>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Identity {
    pub id: Option<String>,
}

impl IdentitySet {
    fn user_id(self) -> Option<String> {
        self.user.and_then(|user| user.id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPreviewResponse {
    pub id: String,
    pub created_date_time: String,
    pub from: Option<IdentitySet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewpointResponse {
    #[serde(default)]
    pub is_hidden: bool,
    pub last_message_read_date_time: Option<String>,
}

/// Entry of `GET /me/chats`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub id: String,
    pub last_message_preview: Option<ChatPreviewResponse>,
    pub viewpoint: Option<ViewpointResponse>,
}

impl ChatResponse {
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.viewpoint.as_ref().is_some_and(|v| v.is_hidden)
    }

    #[must_use]
    pub fn into_summary(self) -> ChatSummary {
        let mut summary = ChatSummary::new(self.id);
        if let Some(preview) = self.last_message_preview {
            summary = summary.with_preview(MessagePreview::new(
                preview.id,
                preview.created_date_time,
                preview.from.and_then(IdentitySet::user_id),
            ));
        }
        if let Some(read) = self.viewpoint.and_then(|v| v.last_message_read_date_time) {
            summary = summary.with_server_last_read(read);
        }
        summary
    }
}

/// Entry of `GET /teams/{team}/channels/{channel}/messages`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessageResponse {
    #[serde(default)]
    pub message_type: String,
    pub created_date_time: String,
    pub from: Option<IdentitySet>,
}

impl ChannelMessageResponse {
    /// Returns a peek for plain messages only.
    #[must_use]
    pub fn into_peek(self) -> Option<ChannelPeek> {
        if self.message_type != "message" {
            return None;
        }
        Some(ChannelPeek::new(
            self.created_date_time,
            self.from.and_then(IdentitySet::user_id),
        ))
    }
}

/// Graph error envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Body of `POST /chats/{id}/markChatReadForUser`.
#[derive(Debug, Serialize)]
pub struct MarkChatReadRequest<'a> {
    pub user: UserRef<'a>,
}

#[derive(Debug, Serialize)]
pub struct UserRef<'a> {
    pub id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_with_preview_and_viewpoint() {
        let chat: ChatResponse = serde_json::from_value(json!({
            "id": "19:abc@thread.v2",
            "topic": null,
            "chatType": "oneOnOne",
            "lastMessagePreview": {
                "id": "1709121600000",
                "createdDateTime": "2026-02-28T12:00:00Z",
                "isDeleted": false,
                "body": { "contentType": "text", "content": "hi" },
                "from": { "user": { "id": "other-user", "displayName": "Other" } }
            },
            "viewpoint": {
                "isHidden": false,
                "lastMessageReadDateTime": "2026-02-28T11:00:00Z"
            }
        }))
        .unwrap();

        assert!(!chat.is_hidden());
        let summary = chat.into_summary();
        let preview = summary.last_message_preview.unwrap();
        assert_eq!(preview.id, "1709121600000");
        assert_eq!(preview.author_id.as_deref(), Some("other-user"));
        assert_eq!(summary.server_last_read.as_deref(), Some("2026-02-28T11:00:00Z"));
    }

    #[test]
    fn test_chat_without_preview_or_sender() {
        let chat: ChatResponse = serde_json::from_value(json!({
            "id": "c1",
            "lastMessagePreview": {
                "id": "m1",
                "createdDateTime": "2026-02-28T12:00:00Z",
                "from": { "application": { "id": "bot" } }
            },
            "viewpoint": { "isHidden": true }
        }))
        .unwrap();

        assert!(chat.is_hidden());
        let summary = chat.into_summary();
        assert!(summary.last_message_preview.unwrap().author_id.is_none());
        assert!(summary.server_last_read.is_none());
    }

    #[test]
    fn test_channel_message_peek_only_for_plain_messages() {
        let message: ChannelMessageResponse = serde_json::from_value(json!({
            "messageType": "message",
            "createdDateTime": "2026-02-28T12:00:00Z",
            "from": { "user": { "id": "u1" } }
        }))
        .unwrap();
        let peek = message.into_peek().unwrap();
        assert_eq!(peek.from_user_id.as_deref(), Some("u1"));

        let system: ChannelMessageResponse = serde_json::from_value(json!({
            "messageType": "systemEventMessage",
            "createdDateTime": "2026-02-28T12:00:00Z",
            "from": null
        }))
        .unwrap();
        assert!(system.into_peek().is_none());
    }

    #[test]
    fn test_mark_read_body_shape() {
        let body = MarkChatReadRequest {
            user: UserRef { id: "me-123" },
        };

        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({ "user": { "id": "me-123" } })
        );
    }
}
