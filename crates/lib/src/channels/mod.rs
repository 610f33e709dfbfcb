//! Communication channels (LINE).
//!
//! Inbound webhook payload types, the reply trait the relay sends through, the LINE
//! Messaging API connector, and webhook signature verification.

mod events;
mod line;
mod reply;
pub mod signature;

pub use events::{parse_batch, BatchError, LineEvent, LineMessage, Skip, TextMessage};
pub use line::{LineChannel, LineError};
pub use reply::{ReplyError, ReplySender};
