//! Webhook HTTP server: `GET /` health text, `POST /webhook` LINE event batches.

use crate::channels::{parse_batch, signature, LineChannel};
use crate::config::{self, Config, Secrets};
use crate::llm::GeminiClient;
use crate::prompt::{self, PromptBuilder};
use crate::relay::Relay;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const HEALTH_TEXT: &str = "LINE Chatbot Webhook is running!";

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct GatewayState {
    pub relay: Arc<Relay>,
    /// When Some, every webhook request must carry a valid X-Line-Signature for this secret.
    pub signature_secret: Option<String>,
}

/// Build the production state: Gemini and LINE clients from resolved secrets, prompt from files.
pub fn build_state(config: &Config, config_path: &Path) -> Result<GatewayState> {
    let secrets = config::resolve_secrets(config)?;
    build_state_with_secrets(config, config_path, secrets)
}

/// Same as [`build_state`] with already resolved secrets.
pub fn build_state_with_secrets(
    config: &Config,
    config_path: &Path,
    secrets: Secrets,
) -> Result<GatewayState> {

    let gemini = GeminiClient::new(
        config.generation.api_base.clone(),
        Some(config.generation.model.clone()),
        secrets.gemini_api_key,
        Some(Duration::from_secs(config.generation.timeout_secs)),
    )
    .context("building gemini client")?;
    let line = LineChannel::new(
        secrets.channel_access_token,
        config.channels.line.api_base.clone(),
        Some(Duration::from_secs(config.channels.line.timeout_secs)),
    )
    .context("building line client")?;

    let prompt_dir = config::resolve_prompt_dir(config, config_path);
    let prompt_ctx = prompt::load_prompt_context(Some(prompt_dir.as_path()));
    log::info!(
        "generation model {}, prompt context {} byte(s)",
        gemini.model(),
        prompt_ctx.persona.len() + prompt_ctx.knowledge.len()
    );

    let relay = Relay::new(
        PromptBuilder::new(&prompt_ctx),
        Arc::new(gemini),
        Arc::new(line),
        config.replies.clone(),
    );

    let signature_secret = if config.channels.line.verify_signature {
        log::info!("X-Line-Signature verification enabled");
        secrets.channel_secret
    } else {
        log::warn!("X-Line-Signature verification disabled; webhook accepts unsigned requests");
        None
    };

    Ok(GatewayState {
        relay: Arc::new(relay),
        signature_secret,
    })
}

/// Routes for the given state.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/webhook", post(line_webhook))
        .with_state(state)
}

/// Load secrets and prompt, bind `gateway.bind:gateway.port`, and serve until Ctrl+C / SIGTERM.
pub async fn run_gateway(config: Config, config_path: impl AsRef<Path>) -> Result<()> {
    let state = build_state(&config, config_path.as_ref())?;
    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("server listening on {}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /webhook: optional signature check, parse the batch, relay every text message, then acknowledge.
async fn line_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    log::debug!("line webhook body: {}", String::from_utf8_lossy(&body));

    if let Some(ref secret) = state.signature_secret {
        let provided = headers
            .get(signature::SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if let Err(e) = signature::verify(secret, &body, provided) {
            log::warn!("rejecting webhook request: {}", e);
            return (StatusCode::FORBIDDEN, "Forbidden");
        }
    }

    let events = match parse_batch(&body) {
        Ok(events) => events,
        Err(e) => {
            log::warn!("rejecting webhook request: {}", e);
            return (StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    // The batch runs in its own task so a caller hanging up does not cancel the remaining events.
    let batch = tokio::spawn(state.relay.clone().handle_batch(events));
    if let Err(e) = batch.await {
        log::error!("webhook batch task failed: {}", e);
    }
    (StatusCode::OK, "OK")
}

/// GET / returns a static health text (for probes).
async fn health_http() -> &'static str {
    HEALTH_TEXT
}
