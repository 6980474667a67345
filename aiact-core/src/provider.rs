//! The generation-model capability consumed by the analysis pipeline and the judge.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// One call to a generation model.
///
/// `response_schema` is a hint only: providers that support a JSON response
/// mode switch it on, and everyone else ignores it. Output is always parsed
/// strictly by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    /// System instruction.
    pub system: String,
    /// User prompt.
    pub prompt: String,
    /// Expected output shape, if the caller wants structured output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            response_schema: None,
            temperature: 0.3,
            max_tokens: 2000,
        }
    }

    /// Attach a JSON schema hint.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A text-generation backend.
///
/// Implementations are treated as slow and fallible. They should map their
/// failures onto [`ModelError`](crate::ModelError) so callers can tell
/// transient errors from fatal ones.
///
/// # Example
///
/// ```rust,ignore
/// use aiact_core::{GenerationProvider, GenerationRequest};
///
/// let request = GenerationRequest::new("You are an expert.", "Classify this project")
///     .with_schema(serde_json::json!({"type": "object"}));
/// let text = provider.generate(request).await?;
/// ```
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Run one generation call and return the raw model text.
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}

/// Connection settings for an Azure OpenAI resource.
///
/// Shared by the chat client and the embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AzureOpenAIConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub api_key: String,
    /// Chat deployment name.
    pub deployment: String,
    pub api_version: String,
    /// Embedding deployment name, if embeddings are served by the same resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_deployment: Option<String>,
    /// Per-request timeout.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl AzureOpenAIConfig {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: "2024-02-15-preview".to_string(),
            embedding_deployment: None,
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_embedding_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.embedding_deployment = Some(deployment.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// URL of a deployment-scoped operation, e.g. `chat/completions`.
    pub fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{deployment}/{operation}?api-version={}",
            self.base_url(),
            self.api_version
        )
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
