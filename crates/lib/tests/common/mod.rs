//! Test helpers: stub upstream servers (Gemini, LINE) and a gateway bound to a free port.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode, Uri},
    Router,
};
use lib::config::{self, Config};
use lib::gateway;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

/// Config path in a fresh temp dir (file not created, so defaults and built-in prompt apply).
pub fn temp_config_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("line-relay-test-{}", uuid::Uuid::new_v4()))
        .join("config.json")
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

type Responder = Arc<dyn Fn(&serde_json::Value) -> (StatusCode, String) + Send + Sync>;

/// A stub HTTP server that records every request and answers via `responder`.
#[derive(Clone)]
pub struct Stub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Stub {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub async fn spawn_stub<F>(responder: F) -> Stub
where
    F: Fn(&serde_json::Value) -> (StatusCode, String) + Send + Sync + 'static,
{
    spawn_stub_with_delay(responder, Duration::ZERO).await
}

pub async fn spawn_stub_with_delay<F>(responder: F, delay: Duration) -> Stub
where
    F: Fn(&serde_json::Value) -> (StatusCode, String) + Send + Sync + 'static,
{
    let requests = Arc::new(Mutex::new(Vec::new()));
    let responder: Responder = Arc::new(responder);
    let recorded = requests.clone();
    let app = Router::new().fallback(move |uri: Uri, headers: HeaderMap, body: Bytes| {
        let recorded = recorded.clone();
        let responder = responder.clone();
        async move {
            let body: serde_json::Value =
                serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
            let header = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string())
            };
            recorded.lock().unwrap().push(RecordedRequest {
                path: uri.path().to_string(),
                query: uri.query().map(|q| q.to_string()),
                authorization: header("authorization"),
                content_type: header("content-type"),
                body: body.clone(),
            });
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            responder(&body)
        }
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Stub {
        base_url: format!("http://{}", addr),
        requests,
    }
}

/// Gemini-shaped success body carrying `text`.
pub fn gemini_body(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

/// The user message at the end of a Gemini request body, after the built-in prompt prefix.
pub fn user_message(body: &serde_json::Value) -> String {
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default();
    let prefix = lib::prompt::PromptBuilder::default();
    prompt
        .strip_prefix(prefix.prefix())
        .unwrap_or(prompt)
        .to_string()
}

/// Config wired to the given stub bases, with secrets set in the file section.
pub fn relay_config(gemini_base: &str, line_base: &str) -> Config {
    let mut config = Config::default();
    config.gateway.bind = "127.0.0.1".to_string();
    config.generation.api_key = Some("test-key".to_string());
    config.generation.api_base = Some(format!("{}/v1beta/models", gemini_base));
    config.channels.line.channel_access_token = Some("test-token".to_string());
    config.channels.line.channel_secret = Some("test-secret".to_string());
    config.channels.line.api_base = Some(line_base.to_string());
    config
}

/// Gateway state for `config`, with secrets taken from the config only (env is ignored).
pub fn gateway_state(config: &Config) -> gateway::GatewayState {
    let secrets = config::config_secrets(config).expect("secrets in config");
    gateway::build_state_with_secrets(config, &temp_config_path(), secrets)
        .expect("build gateway state")
}

/// Serve the gateway router for `config` on a free port; returns its base URL.
pub async fn spawn_gateway(config: Config) -> String {
    spawn_router(gateway_state(&config)).await
}

/// Serve the gateway router for an already built state on a free port.
pub async fn spawn_router(state: gateway::GatewayState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind gateway");
    let addr = listener.local_addr().expect("gateway addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, gateway::router(state)).await;
    });
    format!("http://{}", addr)
}
