//! Relay pipeline: for each LINE text message, build the prompt, generate a reply, send it back.
//!
//! Failures stay inside the event that caused them. Generation never errors (it yields a
//! tagged fallback). A failed delivery is logged and not retried. A panicking event gets
//! one apology attempt.

use crate::channels::{LineEvent, ReplySender, Skip, TextMessage};
use crate::config::RepliesConfig;
use crate::llm::GenerationBackend;
use crate::prompt::PromptBuilder;
use std::sync::Arc;

/// What happened to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Generated text delivered.
    Replied,
    /// A fallback text (generation fallback or apology) delivered instead.
    RepliedWithFallback,
    /// Nothing could be delivered.
    Failed,
    /// Not a text message, or no reply token.
    Skipped,
}

/// Counts per batch, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub received: usize,
    pub replied: usize,
    pub fallbacks: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: EventOutcome) {
        match outcome {
            EventOutcome::Replied => self.replied += 1,
            EventOutcome::RepliedWithFallback => self.fallbacks += 1,
            EventOutcome::Failed => self.failed += 1,
            EventOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Wires prompt building, generation and reply delivery together. Stateless across calls.
pub struct Relay {
    prompt: PromptBuilder,
    generator: Arc<dyn GenerationBackend>,
    sender: Arc<dyn ReplySender>,
    replies: RepliesConfig,
}

impl Relay {
    pub fn new(
        prompt: PromptBuilder,
        generator: Arc<dyn GenerationBackend>,
        sender: Arc<dyn ReplySender>,
        replies: RepliesConfig,
    ) -> Self {
        Self {
            prompt,
            generator,
            sender,
            replies,
        }
    }

    /// Handle every event of one webhook batch.
    ///
    /// Events run one after another in arrival order; each round trip finishes before the
    /// next event starts. Each event runs in its own task so a panic is contained to it.
    pub async fn handle_batch(self: Arc<Self>, events: Vec<LineEvent>) -> BatchSummary {
        let mut summary = BatchSummary {
            received: events.len(),
            ..BatchSummary::default()
        };
        for event in events {
            let msg = match event.text_message() {
                Ok(msg) => msg,
                Err(Skip::NotText) => {
                    log::debug!("ignoring {} event", event.typ);
                    summary.record(EventOutcome::Skipped);
                    continue;
                }
                Err(Skip::NoReplyToken) => {
                    log::warn!("text message without reply token, cannot answer");
                    summary.record(EventOutcome::Skipped);
                    continue;
                }
            };
            let relay = self.clone();
            let reply_token = msg.reply_token.clone();
            let outcome = match tokio::spawn(async move { relay.handle_message(&msg).await }).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::error!("processing line event failed: {}", e);
                    self.send_apology(&reply_token).await
                }
            };
            summary.record(outcome);
        }
        log::info!(
            "webhook batch done: {} event(s), {} replied, {} fallback, {} failed, {} skipped",
            summary.received,
            summary.replied,
            summary.fallbacks,
            summary.failed,
            summary.skipped
        );
        summary
    }

    /// Prompt → generate → reply for one text message.
    pub async fn handle_message(&self, msg: &TextMessage) -> EventOutcome {
        log::info!("user message: {:?}", msg.text);
        log::debug!("reply token: {}", msg.reply_token);

        let prompt = self.prompt.build(&msg.text);
        let generation = self.generator.generate(&prompt).await;
        let fell_back = generation.is_fallback();
        let text = generation.into_text(&self.replies);

        match self.sender.reply(&msg.reply_token, &text).await {
            Ok(()) if fell_back => EventOutcome::RepliedWithFallback,
            Ok(()) => EventOutcome::Replied,
            Err(e) => {
                log::error!("replying via {} failed: {}", self.sender.id(), e);
                EventOutcome::Failed
            }
        }
    }

    async fn send_apology(&self, reply_token: &str) -> EventOutcome {
        match self
            .sender
            .reply(reply_token, &self.replies.internal_error)
            .await
        {
            Ok(()) => EventOutcome::RepliedWithFallback,
            Err(e) => {
                log::error!("apology reply via {} failed: {}", self.sender.id(), e);
                EventOutcome::Failed
            }
        }
    }
}
