//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.line-relay/config.json`) and environment.
//! Secrets are normally supplied through the environment; the file may carry them for local runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Webhook server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Channel settings (LINE).
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Gemini generation settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Where persona and knowledge overrides are read from.
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Fixed texts sent to the user when no real answer can be produced.
    #[serde(default)]
    pub replies: RepliesConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// HTTP port (default 3000). Overridden by PORT env.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; LINE must be able to reach the webhook).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Per-channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub line: LineChannelConfig,
}

/// LINE Messaging API channel config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChannelConfig {
    /// Long-lived channel access token. Overridden by LINE_CHANNEL_ACCESS_TOKEN env.
    pub channel_access_token: Option<String>,
    /// Channel secret (HMAC key for X-Line-Signature). Overridden by LINE_CHANNEL_SECRET env.
    pub channel_secret: Option<String>,
    /// API root (default https://api.line.me). Useful for pointing at a local stub.
    pub api_base: Option<String>,
    /// When true, webhook requests must carry a valid X-Line-Signature. Default: false.
    #[serde(default)]
    pub verify_signature: bool,
    /// Timeout for the reply call, in seconds (default 10).
    #[serde(default = "default_line_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_line_timeout_secs() -> u64 {
    10
}

impl Default for LineChannelConfig {
    fn default() -> Self {
        Self {
            channel_access_token: None,
            channel_secret: None,
            api_base: None,
            verify_signature: false,
            timeout_secs: default_line_timeout_secs(),
        }
    }
}

/// Gemini generateContent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// API key sent as the `key` query parameter. Overridden by GEMINI_API_KEY env.
    pub api_key: Option<String>,
    /// Model id (default "gemini-2.0-flash").
    #[serde(default = "default_generation_model")]
    pub model: String,
    /// Models root (default https://generativelanguage.googleapis.com/v1beta/models).
    pub api_base: Option<String>,
    /// Timeout for the generateContent call, in seconds (default 30).
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_generation_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    30
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_generation_model(),
            api_base: None,
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

/// Prompt file location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptConfig {
    /// Directory holding PERSONA.md and KNOWLEDGE.md. Relative paths are resolved against the config file's parent. Omit to use `prompt` next to the config file.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// User-facing fallback texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepliesConfig {
    /// Sent when Gemini answered but the reply text could not be found.
    #[serde(default = "default_no_content_reply")]
    pub no_content: String,
    /// Sent when the Gemini call itself failed (network, timeout, non-2xx).
    #[serde(default = "default_request_failed_reply")]
    pub request_failed: String,
    /// Sent when processing an event failed unexpectedly (its task panicked).
    #[serde(default = "default_internal_error_reply")]
    pub internal_error: String,
}

fn default_no_content_reply() -> String {
    "ขออภัยครับ ไม่สามารถรับข้อมูลจากระบบ AI ได้ โปรดลองถามคำถามอีกครั้ง".to_string()
}

fn default_request_failed_reply() -> String {
    "ขออภัยครับ เกิดข้อผิดพลาดในการประมวลผลคำถามของคุณ โปรดลองอีกครั้งในภายหลัง".to_string()
}

fn default_internal_error_reply() -> String {
    "I'm sorry, I encountered an internal error. Please try again later.".to_string()
}

impl Default for RepliesConfig {
    fn default() -> Self {
        Self {
            no_content: default_no_content_reply(),
            request_failed: default_request_failed_reply(),
            internal_error: default_internal_error_reply(),
        }
    }
}

/// Secrets the relay needs at runtime, resolved from env and config.
#[derive(Clone)]
pub struct Secrets {
    pub channel_access_token: String,
    pub channel_secret: Option<String>,
    pub gemini_api_key: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("channel_access_token", &"<redacted>")
            .field("channel_secret", &self.channel_secret.as_ref().map(|_| "<redacted>"))
            .field("gemini_api_key", &"<redacted>")
            .finish()
    }
}

/// Env value wins over config value; both are trimmed and empty strings count as unset.
fn pick_value(env_value: Option<String>, config_value: Option<&String>) -> Option<String> {
    env_value
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config_value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the LINE channel access token: env LINE_CHANNEL_ACCESS_TOKEN overrides config.
pub fn resolve_line_access_token(config: &Config) -> Option<String> {
    pick_value(
        std::env::var("LINE_CHANNEL_ACCESS_TOKEN").ok(),
        config.channels.line.channel_access_token.as_ref(),
    )
}

/// Resolve the LINE channel secret: env LINE_CHANNEL_SECRET overrides config.
pub fn resolve_line_channel_secret(config: &Config) -> Option<String> {
    pick_value(
        std::env::var("LINE_CHANNEL_SECRET").ok(),
        config.channels.line.channel_secret.as_ref(),
    )
}

/// Resolve the Gemini API key: env GEMINI_API_KEY overrides config.
pub fn resolve_gemini_api_key(config: &Config) -> Option<String> {
    pick_value(
        std::env::var("GEMINI_API_KEY").ok(),
        config.generation.api_key.as_ref(),
    )
}

/// Resolve the listen port: env PORT overrides config. An unparsable PORT is ignored with a warning.
pub fn resolve_port(config: &Config) -> u16 {
    port_from(std::env::var("PORT").ok(), config.gateway.port)
}

fn port_from(env_value: Option<String>, config_port: u16) -> u16 {
    match env_value {
        Some(s) if !s.trim().is_empty() => match s.trim().parse::<u16>() {
            Ok(p) => p,
            Err(_) => {
                log::warn!("ignoring invalid PORT value {:?}, using {}", s, config_port);
                config_port
            }
        },
        _ => config_port,
    }
}

/// Resolve all secrets needed to serve. Fails when the access token or API key is missing,
/// or when signature verification is enabled without a channel secret.
pub fn resolve_secrets(config: &Config) -> Result<Secrets> {
    secrets_from(
        config,
        resolve_line_access_token(config),
        resolve_line_channel_secret(config),
        resolve_gemini_api_key(config),
    )
}

/// Secrets from the config file alone, ignoring env overrides. Same checks as [`resolve_secrets`].
pub fn config_secrets(config: &Config) -> Result<Secrets> {
    let line = &config.channels.line;
    secrets_from(
        config,
        pick_value(None, line.channel_access_token.as_ref()),
        pick_value(None, line.channel_secret.as_ref()),
        pick_value(None, config.generation.api_key.as_ref()),
    )
}

fn secrets_from(
    config: &Config,
    channel_access_token: Option<String>,
    channel_secret: Option<String>,
    gemini_api_key: Option<String>,
) -> Result<Secrets> {
    let channel_access_token = channel_access_token.context(
        "LINE channel access token not configured (set LINE_CHANNEL_ACCESS_TOKEN or channels.line.channelAccessToken)",
    )?;
    let gemini_api_key = gemini_api_key.context(
        "Gemini API key not configured (set GEMINI_API_KEY or generation.apiKey)",
    )?;
    if config.channels.line.verify_signature && channel_secret.is_none() {
        anyhow::bail!(
            "channels.line.verifySignature is enabled but no channel secret is configured (set LINE_CHANNEL_SECRET or channels.line.channelSecret)"
        );
    }
    if channel_secret.is_none() {
        log::debug!("LINE channel secret not configured");
    }
    Ok(Secrets {
        channel_access_token,
        channel_secret,
        gemini_api_key,
    })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("LINE_RELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".line-relay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default). Missing file => default config.
/// Returns the config and the path that was used (for resolving the prompt directory).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

fn config_parent(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Resolve the prompt directory: `prompt.directory` if set (relative paths resolved against the config file's parent), otherwise `prompt` next to the config file.
pub fn resolve_prompt_dir(config: &Config, config_path: &Path) -> PathBuf {
    let parent = config_parent(config_path);
    match &config.prompt.directory {
        Some(d) if !d.as_os_str().is_empty() => {
            if d.is_absolute() {
                d.clone()
            } else {
                parent.join(d)
            }
        }
        _ => parent.join("prompt"),
    }
}
