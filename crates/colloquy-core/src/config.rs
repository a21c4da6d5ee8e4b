//! Runtime configuration for the capability transport and the workflow.
//!
//! Both structs read their defaults from `COLLOQUY_*` environment variables
//! and can be overridden field by field with the `with_*` builders.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{Category, ColloquyError, Result};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Ceiling on a single backoff sleep between capability retries.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Ceiling on `max_retries` accepted by [`CapabilityConfig::validate`].
pub const MAX_RETRIES: u32 = 10;

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Connection settings for [`HttpCapability`](crate::capability::HttpCapability).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    pub endpoint: String,
    /// Bearer token (optional for local providers).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model used for evaluation and synthesis.
    pub model: String,
    /// Model used for routing; falls back to `model`.
    pub router_model: Option<String>,
    /// Wall-clock limit for a single HTTP attempt (milliseconds).
    pub request_timeout_ms: u64,
    /// Transport retries after the first attempt.
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries (milliseconds).
    pub backoff_base_ms: u64,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        CapabilityConfig {
            endpoint: std::env::var("COLLOQUY_LLM_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            api_key: std::env::var("COLLOQUY_LLM_API_KEY").ok(),
            model: std::env::var("COLLOQUY_LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            router_model: std::env::var("COLLOQUY_ROUTER_MODEL").ok(),
            request_timeout_ms: env_u64("COLLOQUY_LLM_TIMEOUT_MS", 60_000),
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

impl CapabilityConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific endpoint and model
    pub fn new(endpoint: &str, model: &str) -> Self {
        CapabilityConfig {
            endpoint: endpoint.to_string(),
            api_key: None,
            model: model.to_string(),
            router_model: None,
            request_timeout_ms: 60_000,
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }

    /// Send `api_key` as a bearer token.
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    /// Use a separate model for routing.
    pub fn with_router_model(mut self, model: &str) -> Self {
        self.router_model = Some(model.to_string());
        self
    }

    /// Retries after the first attempt and the base backoff delay.
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Per-attempt HTTP timeout.
    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// Per-attempt HTTP timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Sleep before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
    /// saturating and capped at [`MAX_BACKOFF_MS`].
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS))
    }

    /// Reject endpoints, models, timeouts and retry counts the transport cannot use.
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ColloquyError::Config(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.model.trim().is_empty() {
            return Err(ColloquyError::Config("model must not be empty".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ColloquyError::Config(
                "request timeout must be positive".to_string(),
            ));
        }
        if self.max_retries > MAX_RETRIES {
            return Err(ColloquyError::Config(format!(
                "max retries must be at most {MAX_RETRIES}, got {}",
                self.max_retries
            )));
        }
        Ok(())
    }
}

/// Per-invocation workflow settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Upper bound on a single evaluator invocation (milliseconds).
    pub evaluator_timeout_ms: u64,
    /// Categories with a registered evaluator adapter.
    pub enabled_categories: Vec<Category>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            evaluator_timeout_ms: env_u64("COLLOQUY_EVALUATOR_TIMEOUT_MS", 30_000),
            enabled_categories: Category::ALL.to_vec(),
        }
    }
}

impl WorkflowConfig {
    /// Read settings from `COLLOQUY_*` environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Bound each evaluator call.
    pub fn with_evaluator_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.evaluator_timeout_ms = timeout_ms;
        self
    }

    /// Restrict the categories that get an evaluator adapter.
    pub fn with_enabled_categories(mut self, categories: Vec<Category>) -> Self {
        self.enabled_categories = categories;
        self
    }

    /// Evaluator bound as a `Duration`.
    pub fn evaluator_timeout(&self) -> Duration {
        Duration::from_millis(self.evaluator_timeout_ms)
    }

    /// Reject a zero evaluator timeout.
    pub fn validate(&self) -> Result<()> {
        if self.evaluator_timeout_ms == 0 {
            return Err(ColloquyError::Config(
                "evaluator timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config_has_no_key_and_validates() {
        let cfg = CapabilityConfig::new("http://localhost:11434/v1", "llama3");
        assert!(cfg.api_key.is_none());
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_builders() {
        let cfg = CapabilityConfig::new("https://example.test/v1", "m")
            .with_api_key("secret")
            .with_router_model("big")
            .with_retries(0, 10)
            .with_request_timeout_ms(1500);
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.router_model.as_deref(), Some("big"));
        assert_eq!(cfg.max_retries, 0);
        assert_eq!(cfg.backoff_base_ms, 10);
        assert_eq!(cfg.request_timeout_ms, 1500);
    }

    #[test]
    fn test_invalid_capability_config() {
        assert!(CapabilityConfig::new("ftp://x", "m").validate().is_err());
        assert!(CapabilityConfig::new("http://x", " ").validate().is_err());
        assert!(CapabilityConfig::new("http://x", "m")
            .with_request_timeout_ms(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let cfg = CapabilityConfig::new("http://x", "m").with_retries(3, 500);
        assert_eq!(cfg.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(cfg.backoff_delay(2), Duration::from_millis(1_000));
        assert_eq!(cfg.backoff_delay(3), Duration::from_millis(2_000));
        assert_eq!(cfg.backoff_delay(8), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn test_backoff_does_not_overflow_on_large_attempts() {
        let cfg = CapabilityConfig::new("http://x", "m").with_retries(3, u64::MAX);
        assert_eq!(cfg.backoff_delay(0), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(cfg.backoff_delay(65), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(cfg.backoff_delay(u32::MAX), Duration::from_millis(MAX_BACKOFF_MS));

        let small = CapabilityConfig::new("http://x", "m").with_retries(3, 1);
        assert_eq!(small.backoff_delay(64), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn test_retry_count_is_bounded() {
        let cfg = CapabilityConfig::new("http://x", "m");
        assert!(cfg.clone().with_retries(MAX_RETRIES, 1).validate().is_ok());
        assert!(cfg.with_retries(MAX_RETRIES + 1, 1).validate().is_err());
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let cfg = CapabilityConfig::new("http://x", "m").with_api_key("secret");
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_workflow_config() {
        let cfg = WorkflowConfig::default()
            .with_evaluator_timeout_ms(250)
            .with_enabled_categories(vec![Category::Fluency]);
        assert_eq!(cfg.evaluator_timeout(), Duration::from_millis(250));
        assert_eq!(cfg.enabled_categories, vec![Category::Fluency]);
        assert!(cfg.validate().is_ok());
        assert!(cfg.with_evaluator_timeout_ms(0).validate().is_err());
    }
}
