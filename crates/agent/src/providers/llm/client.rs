//! Synchronous JSON-structured LLM client (spec.md §4.5).

use async_trait::async_trait;
use config::{LlmConfig, LlmProvider};
use serde_json::Value;
use tracing::warn;

use crate::error::ErrorCode;

use super::error::classify;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate_json(
        &self,
        prompt: &str,
        schema: Option<&Value>,
        enable_thinking: bool,
    ) -> (Option<Value>, Option<ErrorCode>);
}

/// Strip Markdown code fences (` ```json ... ``` ` or ` ``` ... ``` `)
/// around a JSON payload, if present.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        return rest.strip_suffix("```").unwrap_or(rest).trim();
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        return rest.strip_suffix("```").unwrap_or(rest).trim();
    }
    trimmed
}

/// First-balanced-braces scan: find the first `{...}` span with
/// balanced braces and parse it as JSON, ignoring any surrounding prose.
fn extract_first_json_object(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0i32;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    return serde_json::from_str(&text[start..end]).ok();
                }
            }
            _ => {}
        }
    }
    None
}

/// Best-effort JSON extraction from a raw text payload (spec.md §4.5:
/// "strip code fences; first-balanced-braces scan").
#[must_use]
pub fn parse_best_effort_json(text: &str) -> Option<Value> {
    let stripped = strip_code_fences(text);
    serde_json::from_str(stripped).ok().or_else(|| extract_first_json_object(stripped))
}

/// Stable stub returned in mock mode (spec.md §4.5, S7).
fn mock_stub() -> Value {
    serde_json::json!({
        "summary": "mock LLM response",
        "confidence": 0.5,
    })
}

pub struct HttpLlmClient {
    http: reqwest::Client,
    config: LlmConfig,
    /// Overrides the provider endpoint; lets tests point requests at a
    /// `wiremock` server instead of the real Vertex AI/Anthropic host
    /// (mirrors `cloud::AwsClient::with_base_url`).
    base_url_override: Option<String>,
}

impl HttpLlmClient {
    #[must_use]
    pub fn new(config: LlmConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("reqwest client construction with static config cannot fail");
        Self { http, config, base_url_override: None }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    fn check_provider_configured(&self) -> Option<ErrorCode> {
        match self.config.provider {
            LlmProvider::VertexAi => {
                if self.config.google_cloud_project.is_none() {
                    return Some(ErrorCode::MissingGcpProject);
                }
                if self.config.google_cloud_location.is_none() {
                    return Some(ErrorCode::MissingGcpLocation);
                }
                None
            }
            LlmProvider::Anthropic => {
                if self.config.anthropic_api_key.is_none() {
                    Some(ErrorCode::MissingApiKey)
                } else {
                    None
                }
            }
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn generate_json(
        &self,
        prompt: &str,
        schema: Option<&Value>,
        enable_thinking: bool,
    ) -> (Option<Value>, Option<ErrorCode>) {
        if self.config.mock {
            return (Some(mock_stub()), None);
        }
        if !self.config.enabled {
            return (None, Some(ErrorCode::NotConfigured));
        }
        if let Some(code) = self.check_provider_configured() {
            return (None, Some(code));
        }

        // Schema-mode disables extended thinking automatically (spec.md
        // §4.5: "may be incompatible with thinking on some providers").
        let thinking = enable_thinking && schema.is_none();

        let model = self.config.model.clone().unwrap_or_else(|| "default".to_string());
        let endpoint = self.base_url_override.clone().unwrap_or_else(|| match self.config.provider {
            LlmProvider::VertexAi => format!(
                "https://{}-aiplatform.googleapis.com/v1/projects/{}/locations/{}/publishers/google/models/{model}:generateContent",
                self.config.google_cloud_location.clone().unwrap_or_default(),
                self.config.google_cloud_project.clone().unwrap_or_default(),
                self.config.google_cloud_location.clone().unwrap_or_default(),
            ),
            LlmProvider::Anthropic => "https://api.anthropic.com/v1/messages".to_string(),
        });

        let body = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_output_tokens,
            "schema": schema,
            "thinking": thinking,
        });

        let response = match self.http.post(&endpoint).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                let status = e.status().map(|s| s.as_u16());
                return (None, Some(classify(&e.to_string(), status, &model)));
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => return (None, Some(classify(&e.to_string(), Some(status.as_u16()), &model))),
        };

        if !status.is_success() {
            return (None, Some(classify(&text, Some(status.as_u16()), &model)));
        }

        match parse_best_effort_json(&text) {
            Some(value) => (Some(value), None),
            None => {
                warn!("llm response could not be parsed as JSON");
                (None, Some(ErrorCode::JsonParseFailed))
            }
        }
    }
}
