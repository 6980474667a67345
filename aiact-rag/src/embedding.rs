//! Embedding provider trait for generating vector embeddings from text.

use aiact_core::Result;
use async_trait::async_trait;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends (Azure OpenAI, the
/// offline hashing embedder, ...) behind a unified async interface, so the
/// indexing and retrieval code never changes when the backend does. Failures
/// are reported as [`ModelError`](aiact_core::ModelError)s, which lets callers
/// tell transient provider trouble from fatal misconfiguration.
///
/// # Example
///
/// ```rust,ignore
/// use aiact_rag::EmbeddingProvider;
///
/// let embedding = provider.embed("real-time biometric identification").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name used in logs.
    fn name(&self) -> &str;

    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input. Override this method if the backend
    /// supports native batch embedding for better throughput.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
