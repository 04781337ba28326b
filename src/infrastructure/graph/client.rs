//! Microsoft Graph HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::dto::{
    ChannelMessageResponse, ChatResponse, ErrorResponse, MarkChatReadRequest, MeResponse,
    PageResponse, UserRef,
};
use crate::domain::entities::{AccessToken, ChannelPeek, ChatSummary};
use crate::domain::errors::DataSourceError;
use crate::domain::ports::ChatDataPort;

const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";
const USER_AGENT: &str = concat!("teamy-unread/", env!("CARGO_PKG_VERSION"));
const CHAT_PAGE_SIZE: &str = "50";
const MAX_RETRIES: u32 = 3;
const BASE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Graph API client for chats and channels.
pub struct GraphClient {
    client: Client,
    base_url: String,
    token: AccessToken,
}

impl GraphClient {
    /// Creates new client with default base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(token: AccessToken) -> Result<Self, DataSourceError> {
        Self::with_base_url(GRAPH_API_BASE, token)
    }

    /// Creates client with custom base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: AccessToken,
    ) -> Result<Self, DataSourceError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                DataSourceError::unexpected(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends a request, retrying rate-limited attempts with backoff.
    async fn send<F>(&self, build: F) -> Result<Response, DataSourceError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            let response = build()
                .bearer_auth(self.token.as_str())
                .send()
                .await
                .map_err(map_transport_error)?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let delay = retry_after(&response)
                    .unwrap_or_else(|| BASE_RETRY_DELAY * 2u32.pow(attempt));
                if attempt < MAX_RETRIES {
                    warn!(attempt, delay_ms = delay.as_millis(), "Rate limited by Graph, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return Err(DataSourceError::RateLimited {
                    retry_after_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                });
            }

            return Err(Self::handle_error_response(status, response).await);
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, DataSourceError> {
        let url = self.url(path);
        let response = self.send(|| self.client.get(&url).query(query)).await?;

        response.json::<T>().await.map_err(|e| {
            warn!(path, error = %e, "Failed to parse Graph response");
            DataSourceError::malformed(format!("failed to parse response: {e}"))
        })
    }

    async fn handle_error_response(status: StatusCode, response: Response) -> DataSourceError {
        let url = response.url().path().to_string();
        let retry = retry_after(&response);
        let message = match response.json::<ErrorResponse>().await {
            Ok(error) if !error.error.message.is_empty() => {
                format!("{}: {}", error.error.code, error.error.message)
            }
            _ => format!("HTTP {status}"),
        };

        map_status(status, &url, &message, retry)
    }
}

fn map_transport_error(e: reqwest::Error) -> DataSourceError {
    warn!(error = %e, "Failed to reach Graph API");
    if e.is_timeout() {
        DataSourceError::network("request timed out")
    } else if e.is_connect() {
        DataSourceError::network("failed to connect to Graph")
    } else {
        DataSourceError::network(e.to_string())
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

fn map_status(
    status: StatusCode,
    resource: &str,
    message: &str,
    retry_after: Option<Duration>,
) -> DataSourceError {
    match status {
        StatusCode::UNAUTHORIZED => DataSourceError::rejected("invalid or expired token"),
        StatusCode::FORBIDDEN => DataSourceError::rejected(format!("access denied: {message}")),
        StatusCode::NOT_FOUND => DataSourceError::not_found(resource),
        StatusCode::TOO_MANY_REQUESTS => DataSourceError::RateLimited {
            retry_after_ms: retry_after.map_or(5000, |d| {
                u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
            }),
        },
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            DataSourceError::network("Graph API is temporarily unavailable")
        }
        _ => DataSourceError::unexpected(format!("unexpected response: {status} - {message}")),
    }
}

#[async_trait]
impl ChatDataPort for GraphClient {
    async fn fetch_current_user_id(&self) -> Result<String, DataSourceError> {
        let me: MeResponse = self.get_json("/me", &[]).await?;
        debug!(user_id = %me.id, "Resolved signed-in user");
        Ok(me.id)
    }

    async fn fetch_chats(&self) -> Result<Vec<ChatSummary>, DataSourceError> {
        let page: PageResponse<ChatResponse> = self
            .get_json(
                "/me/chats",
                &[
                    ("$expand", "lastMessagePreview,members"),
                    ("$top", CHAT_PAGE_SIZE),
                ],
            )
            .await?;

        let chats: Vec<ChatSummary> = page
            .value
            .into_iter()
            .filter(|chat| !chat.is_hidden())
            .map(ChatResponse::into_summary)
            .collect();

        debug!(count = chats.len(), "Fetched chats");
        Ok(chats)
    }

    async fn fetch_chat(&self, chat_id: &str) -> Result<Option<ChatSummary>, DataSourceError> {
        let chat: ChatResponse = self
            .get_json(
                &format!("/me/chats/{chat_id}"),
                &[("$expand", "lastMessagePreview,members")],
            )
            .await?;

        if chat.is_hidden() {
            debug!(chat_id, "Skipping hidden chat");
            return Ok(None);
        }
        Ok(Some(chat.into_summary()))
    }

    async fn peek_channel_latest_message(
        &self,
        team_id: &str,
        channel_id: &str,
    ) -> Result<Option<ChannelPeek>, DataSourceError> {
        let path = format!("/teams/{team_id}/channels/{channel_id}/messages");
        let page: PageResponse<ChannelMessageResponse> = self
            .get_json(&path, &[("$top", "1"), ("$orderby", "createdDateTime desc")])
            .await?;

        Ok(page
            .value
            .into_iter()
            .next()
            .and_then(ChannelMessageResponse::into_peek))
    }

    async fn mark_chat_read(&self, chat_id: &str, user_id: &str) -> Result<(), DataSourceError> {
        let url = self.url(&format!("/chats/{chat_id}/markChatReadForUser"));
        let body = MarkChatReadRequest {
            user: UserRef { id: user_id },
        };

        self.send(|| self.client.post(&url).json(&body)).await?;
        debug!(chat_id, "Marked chat read");
        Ok(())
    }
}
