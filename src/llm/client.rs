use crate::error::{FormfillError, Result};
use crate::llm::api::{ApiMessage, ApiRequest, ApiResponse, ResponseFormat};
use crate::llm::config::LlmConfig;

/// Chat gateway over an OpenAI-compatible completions endpoint.
///
/// Every call expects the model to answer with a JSON object; the parsed
/// value is what callers get back. Transport and provider failures are
/// retried per model with linear backoff, then the configured fallback
/// models are tried in order with the same schedule. The last attempt's
/// error propagates when everything fails.
pub struct ChatClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        // The reqwest timeout covers the whole request and aborts the
        // in-flight call when it elapses.
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Send a system+user prompt pair and parse the model's reply as JSON.
    pub async fn chat(&self, system_prompt: &str, user_content: &str) -> Result<serde_json::Value> {
        // At least one attempt always runs, so last_error is always
        // overwritten before it can propagate.
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = FormfillError::ResponseParse("no attempts made".to_string());

        let models = std::iter::once(self.config.model.as_str())
            .chain(self.config.fallback_models.iter().map(String::as_str));

        for model in models {
            for attempt in 1..=max_attempts {
                match self.try_chat(model, system_prompt, user_content).await {
                    Ok(value) => return Ok(value),
                    Err(e) => {
                        log::warn!("chat attempt {attempt}/{max_attempts} on {model} failed: {e}");
                        last_error = e;
                        if attempt < max_attempts {
                            tokio::time::sleep(self.config.retry_delay * attempt).await;
                        }
                    }
                }
            }
            log::warn!("model {model} exhausted its attempts");
        }

        Err(last_error)
    }

    async fn try_chat(
        &self,
        model: &str,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<serde_json::Value> {
        let body = ApiRequest {
            model: model.to_string(),
            messages: vec![
                ApiMessage::system(system_prompt),
                ApiMessage::user(user_content),
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: self
                .config
                .supports_json_mode
                .then(ResponseFormat::json_object),
        };

        let mut request = self
            .client
            .post(self.config.endpoint())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body);

        if self.config.is_openrouter() {
            request = request
                .header("HTTP-Referer", &self.config.site_url)
                .header("X-Title", &self.config.site_name);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FormfillError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        let api_response: ApiResponse = response.json().await?;
        let content = api_response.content().ok_or_else(|| {
            FormfillError::ResponseParse("response contained no message content".to_string())
        })?;

        serde_json::from_str(content).map_err(|e| {
            FormfillError::ResponseParse(format!("model output is not valid JSON: {e}"))
        })
    }
}
