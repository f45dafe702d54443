//! Google Gemini `generateContent` transport.

use base64::{engine::general_purpose, Engine};
use damagemap_core::vision::{ModelError, ModelRequest, RequestPart, VisionModel};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug)]
pub struct GeminiModel {
    cfg: GeminiConfig,
    client: Client,
}

impl GeminiModel {
    pub fn new(cfg: GeminiConfig) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self { cfg, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.model
        )
    }
}

impl VisionModel for GeminiModel {
    fn generate(&self, request: &ModelRequest<'_>) -> Result<String, ModelError> {
        let url = self.endpoint();
        debug!(%url, parts = request.parts.len(), "sending generateContent");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.cfg.api_key)
            .json(&request_body(request))
            .send()
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ModelError::Transport(format!("read response body: {e}")))?;

        if !status.is_success() {
            return Err(error_from_response(status, &body));
        }
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ModelError::Transport(format!("decode response envelope: {e}")))?;
        extract_text(&value)
    }
}

/// Wire body for a request: one user turn with text and inline image parts.
pub fn request_body(request: &ModelRequest<'_>) -> Value {
    let parts: Vec<Value> = request
        .parts
        .iter()
        .map(|part| match part {
            RequestPart::Text(text) => json!({ "text": text }),
            RequestPart::Image { mime_type, data } => json!({
                "inline_data": {
                    "mime_type": mime_type,
                    "data": general_purpose::STANDARD.encode(data),
                }
            }),
        })
        .collect();
    json!({ "contents": [{ "role": "user", "parts": parts }] })
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Concatenated text of the first candidate.
pub fn extract_text(envelope: &Value) -> Result<String, ModelError> {
    let env: Envelope = serde_json::from_value(envelope.clone())
        .map_err(|e| ModelError::Transport(format!("decode response envelope: {e}")))?;
    let text: String = env
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    Ok(text)
}

/// Map a non-success response to [`ModelError`]. HTTP 429 and
/// `RESOURCE_EXHAUSTED` are rate limits; the suggested delay comes from the
/// `RetryInfo` detail when present.
pub fn error_from_response(status: StatusCode, body: &str) -> ModelError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let api_status = error
        .and_then(|e| e.get("status"))
        .and_then(Value::as_str)
        .unwrap_or("");

    if status == StatusCode::TOO_MANY_REQUESTS || api_status == "RESOURCE_EXHAUSTED" {
        let from_details = error
            .and_then(|e| e.get("details"))
            .and_then(Value::as_array)
            .and_then(|details| {
                details
                    .iter()
                    .filter_map(|d| d.get("retryDelay").and_then(Value::as_str))
                    .find_map(parse_retry_delay)
            });
        return ModelError::RateLimited {
            retry_after: from_details.or_else(|| scan_retry_delay(body)),
        };
    }

    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.chars().take(300).collect());
    ModelError::Http {
        status: status.as_u16(),
        message,
    }
}

/// Parse a protobuf duration string such as `"37s"` or `"1.5s"`.
pub fn parse_retry_delay(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().strip_suffix('s')?.parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

// Last resort for bodies that are not the documented JSON shape: first run
// of digits after "retryDelay".
fn scan_retry_delay(body: &str) -> Option<Duration> {
    let (_, rest) = body.split_once("retryDelay")?;
    let digits: String = rest
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok().map(Duration::from_secs)
}
