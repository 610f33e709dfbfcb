//! Outbound side of a channel: answer an inbound event.

use async_trait::async_trait;

/// A reply the channel could not deliver.
#[derive(Debug, thiserror::Error)]
#[error("{channel} reply failed: {message}")]
pub struct ReplyError {
    pub channel: &'static str,
    pub message: String,
}

impl ReplyError {
    pub fn new(channel: &'static str, message: impl Into<String>) -> Self {
        Self {
            channel,
            message: message.into(),
        }
    }
}

/// Sends a text reply bound to a reply token. Single attempt, no retry.
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Channel id (e.g. "line").
    fn id(&self) -> &'static str;
    /// Reply to the event that issued `reply_token`.
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), ReplyError>;
}
