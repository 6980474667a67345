//! Query-time retrieval: embed the query, then search the collection.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::RagConfig;
use crate::document::RetrievedContext;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Default number of chunks returned per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Pulls the chunks most similar to a query out of one collection.
///
/// Embedding failures surface as [`RagError::Embedding`], separate from an
/// empty result, so callers can decide to retry or carry on without context.
#[derive(Clone)]
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    collection: String,
    top_k: usize,
    similarity_threshold: f32,
}

impl Retriever {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedding_provider,
            vector_store,
            collection: collection.into(),
            top_k: DEFAULT_TOP_K,
            similarity_threshold: 0.0,
        }
    }

    pub fn from_config(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
        config: &RagConfig,
    ) -> Self {
        Self::new(embedding_provider, vector_store, config.collection.clone())
            .with_top_k(config.top_k)
            .with_similarity_threshold(config.similarity_threshold)
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Drop results scoring below `threshold`.
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Retrieve with the configured `top_k`.
    pub async fn retrieve(&self, query: &str) -> Result<RetrievedContext> {
        self.retrieve_top(query, self.top_k).await
    }

    /// Retrieve at most `top_k` chunks for `query`.
    pub async fn retrieve_top(&self, query: &str, top_k: usize) -> Result<RetrievedContext> {
        debug!(collection = %self.collection, query_len = query.len(), top_k, "retrieving");

        let embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(provider = self.embedding_provider.name(), error = %e, "query embedding failed");
            RagError::Embedding(e)
        })?;

        let mut context = self.vector_store.query(&self.collection, &embedding, top_k).await?;
        let threshold = self.similarity_threshold;
        context.entries.retain(|entry| entry.score >= threshold);

        if context.is_empty() {
            warn!(collection = %self.collection, "no context retrieved");
        } else {
            info!(collection = %self.collection, result_count = context.len(), "retrieved context");
        }
        Ok(context)
    }
}
