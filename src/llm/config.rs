use crate::error::{FormfillError, Result};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Chat gateway configuration. Built once and passed by value into the
/// client; there is no ambient mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    /// OpenRouter attribution headers (HTTP-Referer / X-Title).
    pub site_url: String,
    pub site_name: String,
    /// Whether the provider accepts `response_format: json_object`.
    pub supports_json_mode: bool,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
    /// Tries per model before moving on; at least 1.
    pub max_attempts: u32,
    /// Base backoff unit; attempt n waits `retry_delay * n`.
    pub retry_delay: Duration,
    /// Models tried in order after the primary exhausts its attempts.
    pub fallback_models: Vec<String>,
}

impl LlmConfig {
    /// Create a configuration with the given API key and defaults for
    /// everything else.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(FormfillError::MissingApiKey);
        }
        Ok(Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            site_url: "https://formfill.dev".to_string(),
            site_name: "formfill".to_string(),
            supports_json_mode: true,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            fallback_models: Vec::new(),
        })
    }

    /// Build from `FORMFILL_*` environment variables. `FORMFILL_API_KEY` is
    /// required; everything else falls back to the defaults above.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparsable numeric values fall
    /// back to their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = get("FORMFILL_API_KEY").ok_or(FormfillError::MissingApiKey)?;
        let mut config = Self::new(api_key)?;

        if let Some(model) = get("FORMFILL_MODEL") {
            config.model = model;
        }
        if let Some(url) = get("FORMFILL_BASE_URL") {
            config.base_url = url;
        }
        if let Some(url) = get("FORMFILL_SITE_URL") {
            config.site_url = url;
        }
        if let Some(name) = get("FORMFILL_SITE_NAME") {
            config.site_name = name;
        }
        if let Some(v) = get("FORMFILL_JSON_MODE") {
            config.supports_json_mode = v != "false";
        }
        if let Some(t) = get("FORMFILL_TEMPERATURE").and_then(|v| v.parse().ok()) {
            config.temperature = t;
        }
        if let Some(n) = get("FORMFILL_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            config.max_tokens = n;
        }
        if let Some(ms) = get("FORMFILL_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = get("FORMFILL_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            config.max_attempts = n;
        }
        if let Some(ms) = get("FORMFILL_RETRY_DELAY_MS").and_then(|v| v.parse().ok()) {
            config.retry_delay = Duration::from_millis(ms);
        }
        if let Some(list) = get("FORMFILL_FALLBACK_MODELS") {
            config.fallback_models = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_fallback_models(mut self, models: Vec<String>) -> Self {
        self.fallback_models = models;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// OpenRouter endpoints get the attribution headers.
    pub fn is_openrouter(&self) -> bool {
        self.base_url.contains("openrouter.ai")
    }

    /// Full chat-completions endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
