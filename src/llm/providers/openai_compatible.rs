//! OpenAI-compatible text completion provider (`/v1/completions`).
//!
//! Talks to any server exposing the plain completions endpoint (vLLM,
//! llama.cpp server, text-generation-inference, hosted OpenAI). All wire
//! types are private to this module: callers only see `complete` and `ping`.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::config::OpenAiConfig;
use crate::llm::{CompletionRequest, ProviderError};

/// Hard cap for the startup reachability check, independent of the
/// generation timeout.
const PING_TIMEOUT: Duration = Duration::from_secs(5);

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for any HTTP endpoint implementing `/v1/completions`.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    top_p: f32,
    repetition_penalty: f32,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Build a provider from config values and an optional API key.
    ///
    /// `api_key` is `None` for keyless local models. When present it is sent
    /// as `Authorization: Bearer <key>` on every request.
    pub fn new(config: &OpenAiConfig, api_key: Option<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            repetition_penalty: config.repetition_penalty,
            api_key,
        })
    }

    /// Lightweight reachability probe.
    ///
    /// Sends a HEAD request to the configured endpoint.  Any HTTP response
    /// (including 4xx) means the server is reachable.  Only a transport-level
    /// failure (connection refused, DNS, timeout) is treated as unreachable.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        let mut req = self.client.head(&self.api_base_url).timeout(PING_TIMEOUT);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req.send()
            .await
            .map(|_| ())
            .map_err(|e| ProviderError::Request(format!("unreachable: {e}")))
    }

    /// One completion round-trip. Returns the first choice's text untouched.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let payload = CompletionPayload {
            model: &self.model,
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            repetition_penalty: (self.repetition_penalty != 1.0).then_some(self.repetition_penalty),
        };

        debug!(
            model = %payload.model,
            max_tokens = payload.max_tokens,
            prompt_len = request.prompt.len(),
            "sending completion request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full completion request payload");
        }

        let mut req = self.client.post(&self.api_base_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, "completion HTTP request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;

        let response = check_status(response).await?;

        let parsed = response.json::<CompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize completion response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        debug!(choices = parsed.choices.len(), "received completion response");

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ProviderError::Request("empty or missing text in response".into()))
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionPayload<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition_penalty: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    text: String,
}

// Error envelope used by OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    error!(%status, "completion request returned HTTP error");
    Err(ProviderError::Request(describe_error(status, &body)))
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => {
            let code = env
                .error
                .code
                .map(|v| match v {
                    serde_json::Value::String(s) => format!(" [code={s}]"),
                    other => format!(" [code={other}]"),
                })
                .unwrap_or_default();
            format!("HTTP {status}{code}: {}", env.error.message)
        }
        Err(_) => format!("HTTP {status}: {body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn payload_omits_neutral_repetition_penalty() {
        let payload = CompletionPayload {
            model: "m",
            prompt: "p",
            max_tokens: 10,
            temperature: 0.8,
            top_p: 0.9,
            repetition_penalty: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("repetition_penalty").is_none());
        assert_eq!(json["max_tokens"], 10);
    }

    #[test]
    fn response_text_parses() {
        let parsed: CompletionResponse =
            serde_json::from_str(r#"{"choices":[{"text":" once upon a time","index":0}]}"#).unwrap();
        assert_eq!(parsed.choices[0].text, " once upon a time");
    }

    #[test]
    fn error_envelope_described() {
        let msg = describe_error(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
            r#"{"error":{"message":"model loading","code":"busy"}}"#,
        );
        assert!(msg.contains("503"));
        assert!(msg.contains("[code=busy]"));
        assert!(msg.contains("model loading"));
    }

    #[test]
    fn plain_error_body_described() {
        let msg = describe_error(reqwest::StatusCode::BAD_GATEWAY, "upstream gone");
        assert!(msg.ends_with("upstream gone"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails() {
        let mut cfg = Config::test_default().llm.openai;
        cfg.api_base_url = "http://127.0.0.1:1/v1/completions".into();
        let p = OpenAiCompatibleProvider::new(&cfg, None).unwrap();

        assert!(p.ping().await.is_err());
        let req = CompletionRequest { prompt: "hi".into(), max_tokens: 5 };
        assert!(p.complete(&req).await.is_err());
    }
}
