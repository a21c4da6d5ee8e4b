//! OpenAI-compatible chat-completions capability.
//!
//! Sends the instruction and user content as a system/user message pair with
//! `response_format = json_object`, parses the returned message content as
//! JSON and checks it against the request schema. Transport errors, timeouts,
//! 429 and 5xx responses are retried with capped exponential backoff.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{CapabilityError, CapabilityRequest, Purpose, TextCapability};
use crate::config::CapabilityConfig;

/// Capability backed by an HTTP chat-completions endpoint.
pub struct HttpCapability {
    config: CapabilityConfig,
    client: reqwest::Client,
}

impl HttpCapability {
    /// Build the HTTP client for `config`.
    pub fn new(config: CapabilityConfig) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("colloquy/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CapabilityError::Unavailable(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Create a capability from environment variables
    pub fn from_env() -> Result<Self, CapabilityError> {
        Self::new(CapabilityConfig::from_env())
    }

    fn model_for(&self, purpose: Purpose) -> &str {
        match purpose {
            Purpose::Route => self
                .config
                .router_model
                .as_deref()
                .unwrap_or(&self.config.model),
            Purpose::Evaluate(_) | Purpose::Synthesize => &self.config.model,
        }
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }

    fn build_headers(&self) -> Result<HeaderMap, CapabilityError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.config.api_key {
            let auth = format!("Bearer {key}");
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth)
                    .map_err(|e| CapabilityError::Unavailable(format!("invalid api key: {e}")))?,
            );
        }
        Ok(headers)
    }

    pub(crate) fn build_payload(&self, request: &CapabilityRequest) -> Value {
        let system = format!(
            "{}\n\n{}",
            request.system_instruction.trim_end(),
            request.schema.render()
        );
        json!({
            "model": self.model_for(request.purpose),
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": request.user_content },
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.0,
        })
    }

    /// Extract and decode the first choice's message content.
    pub(crate) fn parse_content(body: &Value) -> Result<Value, CapabilityError> {
        let content = body
            .get("choices")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                CapabilityError::MalformedResponse("no message content in response".to_string())
            })?;

        serde_json::from_str(strip_code_fence(content))
            .map_err(|e| CapabilityError::MalformedResponse(format!("content is not JSON: {e}")))
    }

    async fn send_once(
        &self,
        headers: HeaderMap,
        payload: &Value,
    ) -> Result<Value, CapabilityError> {
        let response = self
            .client
            .post(self.url())
            .headers(headers)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CapabilityError::MalformedResponse(e.to_string()))
    }

    fn map_reqwest_error(&self, err: reqwest::Error) -> CapabilityError {
        if err.is_timeout() {
            CapabilityError::Timeout {
                timeout_ms: self.config.request_timeout_ms,
            }
        } else {
            CapabilityError::Transport(err.to_string())
        }
    }
}

/// Providers sometimes wrap JSON in a markdown fence despite `json_object`.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait]
impl TextCapability for HttpCapability {
    async fn invoke(&self, request: CapabilityRequest) -> Result<Value, CapabilityError> {
        let payload = self.build_payload(&request);
        let max_attempts = self.config.max_retries.saturating_add(1);

        let mut attempt = 1;
        let body = loop {
            let headers = self.build_headers()?;
            match self.send_once(headers, &payload).await {
                Ok(body) => break body,
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.config.backoff_delay(attempt);
                    warn!(
                        purpose = %request.purpose,
                        attempt,
                        error = %e,
                        "capability call failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        let value = Self::parse_content(&body)?;
        request
            .schema
            .check(&value)
            .map_err(CapabilityError::SchemaViolation)?;
        debug!(purpose = %request.purpose, attempt, "capability call succeeded");
        Ok(value)
    }

    fn name(&self) -> &str {
        "http"
    }
}
