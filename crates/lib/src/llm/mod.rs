//! Generation abstraction and Gemini client.
//!
//! The relay talks to a `GenerationBackend`; `GeminiClient` is the production backend
//! (single-turn `generateContent`).

mod backend;
mod gemini;

pub use backend::{FallbackReason, Generation, GenerationBackend};
pub use gemini::{extract_reply_text, GeminiClient, GeminiError};
