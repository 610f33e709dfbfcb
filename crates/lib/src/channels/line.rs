//! LINE channel: reply to webhook events via the Messaging API.

use crate::channels::reply::{ReplyError, ReplySender};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const CHANNEL_ID: &str = "line";
const LINE_API_BASE: &str = "https://api.line.me";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("line request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("line api error: {0}")]
    Api(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: Vec<OutboundMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    #[serde(rename = "type")]
    typ: &'static str,
    text: &'a str,
}

/// LINE Messaging API connector: sends replies with the channel access token.
pub struct LineChannel {
    api_base: String,
    access_token: String,
    client: reqwest::Client,
}

impl LineChannel {
    pub fn new(
        access_token: String,
        api_base: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, LineError> {
        let api_base = api_base
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| LINE_API_BASE.to_string());
        let client = reqwest::Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;
        Ok(Self {
            api_base,
            access_token,
            client,
        })
    }

    /// POST /v2/bot/message/reply with a single text message.
    pub async fn reply_message(&self, reply_token: &str, text: &str) -> Result<(), LineError> {
        let url = format!("{}/v2/bot/message/reply", self.api_base);
        let body = ReplyRequest {
            reply_token,
            messages: vec![OutboundMessage { typ: "text", text }],
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LineError::Api(format!("{} {}", status, body)));
        }
        let body = res.text().await.unwrap_or_default();
        log::debug!("line reply response: {}", body);
        Ok(())
    }
}

#[async_trait]
impl ReplySender for LineChannel {
    fn id(&self) -> &'static str {
        CHANNEL_ID
    }

    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), ReplyError> {
        LineChannel::reply_message(self, reply_token, text)
            .await
            .map_err(|e| ReplyError::new(CHANNEL_ID, e.to_string()))
    }
}
