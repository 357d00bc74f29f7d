//! Outgoing chat messages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{BotError, BotResult};

/// Default `chat.postMessage` endpoint
pub const DEFAULT_CHAT_API_URL: &str = "https://slack.com/api/chat.postMessage";

/// Posts messages to a chat channel.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Post `text` to `channel`, replying in `thread_ts` when given.
    /// Returns the timestamp of the new message.
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> BotResult<String>;
}

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    ts: String,
    #[serde(default)]
    error: Option<String>,
}

/// Slack Web API client authenticated with a bot token.
#[derive(Debug, Clone)]
pub struct SlackClient {
    http_client: reqwest::Client,
    url: String,
    token: String,
}

impl SlackClient {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> BotResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("payload-reportd/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http_client,
            url: url.into(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl ChatApi for SlackClient {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> BotResult<String> {
        let post = PostMessage {
            channel,
            text,
            thread_ts,
        };
        debug!(channel, thread_ts, "posting chat message");

        let body = self
            .http_client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&post)
            .send()
            .await?
            .bytes()
            .await?;
        let resp: PostMessageResponse = serde_json::from_slice(&body)
            .map_err(|e| BotError::Chat(format!("unreadable response: {}", e)))?;
        if !resp.ok {
            return Err(BotError::Chat(
                resp.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(resp.ts)
    }
}
