//! Azure OpenAI embedding provider.
//!
//! This module is only available when the `azure` feature is enabled.

use aiact_core::{AzureOpenAIConfig, ModelError, Result, truncate_chars};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;

const PROVIDER: &str = "AzureOpenAI";

/// The default embedding deployment.
const DEFAULT_DEPLOYMENT: &str = "text-embedding-ada-002";

/// Dimensionality of `text-embedding-ada-002`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// Inputs sent per request.
const BATCH_SIZE: usize = 16;

/// Inputs are cut to this many characters before they are sent.
const MAX_INPUT_CHARS: usize = 8000;

/// An [`EmbeddingProvider`] backed by an Azure OpenAI embeddings deployment.
///
/// Posts to `{endpoint}/openai/deployments/{deployment}/embeddings` with the
/// `api-key` header, in batches of up to 16 inputs. Each request is bounded by
/// the config's `request_timeout`.
///
/// # Example
///
/// ```rust,ignore
/// use aiact_core::AzureOpenAIConfig;
/// use aiact_rag::openai::AzureOpenAIEmbeddingProvider;
///
/// let config = AzureOpenAIConfig::new(endpoint, api_key, "gpt-4");
/// let provider = AzureOpenAIEmbeddingProvider::new(config)?;
/// let embedding = provider.embed("Article 5").await?;
/// ```
pub struct AzureOpenAIEmbeddingProvider {
    client: reqwest::Client,
    config: AzureOpenAIConfig,
    deployment: String,
    dimensions: usize,
}

impl AzureOpenAIEmbeddingProvider {
    /// Create a provider for the config's embedding deployment
    /// (`text-embedding-ada-002` when unset).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Auth`] when the API key is empty and
    /// [`ModelError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: AzureOpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ModelError::Auth {
                provider: PROVIDER.into(),
                message: "API key must not be empty".into(),
            });
        }
        let client = reqwest::Client::builder().timeout(config.request_timeout).build().map_err(
            |e| ModelError::Transport {
                provider: PROVIDER.into(),
                message: format!("failed to build HTTP client: {e}"),
            },
        )?;
        let deployment =
            config.embedding_deployment.clone().unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string());

        Ok(Self { client, config, deployment, dimensions: DEFAULT_DIMENSIONS })
    }

    /// Override the reported dimensionality for non-ada deployments.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }

    async fn embed_request(&self, inputs: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let url = self.config.deployment_url(&self.deployment, "embeddings");
        let expected = inputs.len();

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .json(&EmbeddingRequest { input: inputs })
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(provider = PROVIDER, %status, "API error");
            return Err(ModelError::from_http_status(PROVIDER, status.as_u16(), detail));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            ModelError::MalformedOutput(format!("failed to parse embeddings response: {e}"))
        })?;
        if parsed.data.len() != expected {
            return Err(ModelError::MalformedOutput(format!(
                "expected {expected} embeddings, got {}",
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn transport_error(&self, e: &reqwest::Error) -> ModelError {
        error!(provider = PROVIDER, error = %e, "request failed");
        if e.is_timeout() {
            ModelError::Timeout { provider: PROVIDER.into(), after: self.config.request_timeout }
        } else {
            ModelError::Transport { provider: PROVIDER.into(), message: format!("request failed: {e}") }
        }
    }
}

/// Cut `text` to at most [`MAX_INPUT_CHARS`] characters.
fn truncate_input(text: &str) -> &str {
    truncate_chars(text, MAX_INPUT_CHARS)
}

// ── Azure OpenAI API request/response types ────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for AzureOpenAIEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");
        let results = self.embed_request(vec![truncate_input(text)]).await?;
        results.into_iter().next().ok_or_else(|| {
            ModelError::MalformedOutput("API returned empty embeddings response".into())
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            debug!(
                provider = PROVIDER,
                batch_size = batch.len(),
                deployment = %self.deployment,
                "embedding batch"
            );
            let inputs = batch.iter().map(|t| truncate_input(t)).collect();
            results.extend(self.embed_request(inputs).await?);
        }
        Ok(results)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
