//! LINE webhook payload: `{ "destination", "events": [...] }`.
//!
//! Parsing is lenient per event: only the outer `events` array is required. Events that
//! are not objects, or carry unknown fields and types, never fail the batch.

use serde::Deserialize;

/// One webhook event. Only the fields the relay reads are modelled.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineEvent {
    #[serde(rename = "type", default)]
    pub typ: String,
    #[serde(default)]
    pub message: Option<LineMessage>,
    #[serde(default)]
    pub reply_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineMessage {
    #[serde(rename = "type", default)]
    pub typ: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// A text message ready for the relay: user text bound to the reply token of the same event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub text: String,
    pub reply_token: String,
}

/// Why an event was not turned into a `TextMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Not a message event, or a non-text message (sticker, image, ...).
    NotText,
    /// A text message without a reply token; nothing can be sent back.
    NoReplyToken,
}

impl LineEvent {
    /// `type == "message"` and `message.type == "text"`.
    pub fn is_text_message(&self) -> bool {
        self.typ == "message"
            && self
                .message
                .as_ref()
                .map(|m| m.typ == "text")
                .unwrap_or(false)
    }

    pub fn text_message(&self) -> Result<TextMessage, Skip> {
        if !self.is_text_message() {
            return Err(Skip::NotText);
        }
        let text = self
            .message
            .as_ref()
            .and_then(|m| m.text.clone())
            .unwrap_or_default();
        let reply_token = self
            .reply_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(Skip::NoReplyToken)?;
        Ok(TextMessage {
            text,
            reply_token: reply_token.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("request body is not valid JSON")]
    InvalidJson,
    #[error("request body has no events list")]
    MissingEvents,
}

/// Parse a webhook body into its events. Fails only when the body is not JSON or has no
/// `events` array; individual events that cannot be read are dropped with a debug log.
pub fn parse_batch(body: &[u8]) -> Result<Vec<LineEvent>, BatchError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| BatchError::InvalidJson)?;
    let events = value
        .get("events")
        .and_then(|v| v.as_array())
        .ok_or(BatchError::MissingEvents)?;
    Ok(events
        .iter()
        .filter_map(|e| match serde_json::from_value::<LineEvent>(e.clone()) {
            Ok(ev) => Some(ev),
            Err(err) => {
                log::debug!("skipping unreadable webhook event: {}", err);
                None
            }
        })
        .collect())
}
