//! Azure OpenAI client implementation.

use aiact_core::{AzureOpenAIConfig, GenerationProvider, GenerationRequest, ModelError, Result};
use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::types::{ChatMessage, ChatRequest, ChatResponse, ErrorResponse, ResponseFormat};

const PROVIDER: &str = "AzureOpenAI";

/// Azure OpenAI chat client.
///
/// Sends the system instruction and the prompt as two messages. When the
/// request carries a schema hint, JSON mode (`response_format = json_object`)
/// is switched on. Requests are bounded by the config's `request_timeout`.
pub struct AzureOpenAIClient {
    client: reqwest::Client,
    config: AzureOpenAIConfig,
}

impl AzureOpenAIClient {
    /// Create a new Azure OpenAI client.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Auth`] for an empty API key and
    /// [`ModelError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: AzureOpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ModelError::Auth {
                provider: PROVIDER.into(),
                message: "API key must not be empty".into(),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ModelError::Transport {
                provider: PROVIDER.into(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    pub fn deployment(&self) -> &str {
        &self.config.deployment
    }
}

#[async_trait]
impl GenerationProvider for AzureOpenAIClient {
    fn name(&self) -> &str {
        &self.config.deployment
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let url = self.config.deployment_url(&self.config.deployment, "chat/completions");
        let body = ChatRequest {
            messages: [
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.prompt },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.response_schema.as_ref().map(|_| ResponseFormat::json_object()),
        };
        debug!(
            provider = PROVIDER,
            deployment = %self.config.deployment,
            prompt_len = request.prompt.len(),
            json_mode = body.response_format.is_some(),
            "chat completion"
        );

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                if e.is_timeout() {
                    ModelError::Timeout { provider: PROVIDER.into(), after: self.config.request_timeout }
                } else {
                    ModelError::Transport { provider: PROVIDER.into(), message: format!("request failed: {e}") }
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let detail =
                serde_json::from_str::<ErrorResponse>(&text).map(|e| e.error.message).unwrap_or(text);
            error!(provider = PROVIDER, %status, "API error");
            return Err(ModelError::from_http_status(PROVIDER, status.as_u16(), detail));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ModelError::MalformedOutput(format!("failed to parse chat completion: {e}"))
        })?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::MalformedOutput("no choices in response".to_string()))?;
        if choice.finish_reason.as_deref() == Some("length") {
            warn!(provider = PROVIDER, max_tokens = request.max_tokens, "completion truncated");
        }

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(ModelError::MalformedOutput("empty completion".to_string())),
        }
    }
}
