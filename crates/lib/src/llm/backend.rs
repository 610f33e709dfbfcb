//! Generation result and backend trait.

use crate::config::RepliesConfig;
use async_trait::async_trait;

/// Why no generated text is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The API answered but the reply text was absent, empty, or mis-shaped.
    NoContent,
    /// The call failed: network error, timeout, or non-2xx status.
    RequestFailed,
}

/// Outcome of one generation call. Never an error: failures are tagged fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Reply(String),
    Fallback(FallbackReason),
}

impl Generation {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Generation::Fallback(_))
    }

    /// Text to send to the user: the generated reply or the configured fallback string.
    pub fn into_text(self, replies: &RepliesConfig) -> String {
        match self {
            Generation::Reply(text) => text,
            Generation::Fallback(FallbackReason::NoContent) => replies.no_content.clone(),
            Generation::Fallback(FallbackReason::RequestFailed) => replies.request_failed.clone(),
        }
    }
}

/// Produces a reply for a fully composed prompt.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Generation;
}
