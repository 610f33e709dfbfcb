//! Gateway: the HTTP surface LINE calls.
//!
//! Single port serves the health probe and the webhook. Requests are acknowledged with
//! `200 OK` once the batch has been relayed, whatever the per-event outcome.

mod server;

pub use server::{build_state, build_state_with_secrets, router, run_gateway, GatewayState, HEALTH_TEXT};
