//! Gemini API client (generativelanguage.googleapis.com by default).
//! Single-turn, non-streaming `generateContent`; the API key travels in the `key` query parameter.

use crate::llm::backend::{FallbackReason, Generation, GenerationBackend};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("gemini request failed: {0}")]
    Request(reqwest::Error),
    #[error("gemini api error: {0}")]
    Api(String),
}

// The request URL carries the API key; keep it out of the error.
impl From<reqwest::Error> for GeminiError {
    fn from(e: reqwest::Error) -> Self {
        GeminiError::Request(e.without_url())
    }
}

impl GeminiClient {
    pub fn new(
        base_url: Option<String>,
        model: Option<String>,
        api_key: String,
        timeout: Option<Duration>,
    ) -> Result<Self, GeminiError> {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let client = reqwest::Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;
        Ok(Self {
            base_url,
            model,
            api_key,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// POST /{model}:generateContent, returning the raw JSON body on a 2xx status.
    pub async fn generate_content(&self, prompt: &str) -> Result<serde_json::Value, GeminiError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };
        let res = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(GeminiError::Api(format!("{} {}", status, body)));
        }
        let text = res.text().await?;
        // A 2xx body that is not JSON is a shape problem, not a transport one.
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn generate(&self, prompt: &str) -> Generation {
        match self.generate_content(prompt).await {
            Ok(data) => {
                log::debug!("gemini response: {}", data);
                match extract_reply_text(&data) {
                    Some(text) => Generation::Reply(text),
                    None => {
                        log::warn!("gemini response structure unexpected or content missing");
                        Generation::Fallback(FallbackReason::NoContent)
                    }
                }
            }
            Err(e) => {
                log::error!("calling gemini ({}) failed: {}", self.model, e);
                Generation::Fallback(FallbackReason::RequestFailed)
            }
        }
    }
}

/// Text at `candidates[0].content.parts[0].text`, if present and non-blank.
pub fn extract_reply_text(data: &serde_json::Value) -> Option<String> {
    let response: GenerateContentResponse = serde_json::from_value(data.clone()).ok()?;
    let text = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text?;
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
