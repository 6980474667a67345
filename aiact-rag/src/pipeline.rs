//! Corpus indexing orchestrator.
//!
//! The [`IndexingPipeline`] turns a legislative source document into an
//! indexed collection: clean → chunk → embed → store. It also hands out
//! [`Retriever`]s bound to the same embedder, store and collection.
//!
//! # Example
//!
//! ```rust,ignore
//! use aiact_rag::{IndexingPipeline, RagConfig, InMemoryVectorStore, FixedSizeChunker};
//!
//! let pipeline = IndexingPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! pipeline.index(&Document::new("eu_ai_act", source_text), false).await?;
//! let context = pipeline.retriever().retrieve("biometric identification").await?;
//! ```

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::chunking::{Chunker, FixedSizeChunker, clean_text};
use crate::config::RagConfig;
use crate::document::Document;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::retriever::Retriever;
use crate::vectorstore::{CollectionStats, IndexOutcome, VectorStore};

/// Indexes source documents into the configured collection.
///
/// Construct one via [`IndexingPipeline::builder()`].
pub struct IndexingPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
}

impl IndexingPipeline {
    /// Create a new [`IndexingPipelineBuilder`].
    pub fn builder() -> IndexingPipelineBuilder {
        IndexingPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Index `document` into the configured collection.
    ///
    /// Without `force_reindex` an already indexed collection is left alone
    /// and no embedding calls are made. With it, the collection is replaced
    /// once the new chunks are fully embedded.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the provider fails and store
    /// errors unchanged.
    #[instrument(skip(self, document), fields(collection = %self.config.collection, document.id = %document.id))]
    pub async fn index(&self, document: &Document, force_reindex: bool) -> Result<IndexOutcome> {
        let collection = self.collection();

        if !force_reindex {
            let stats = self.vector_store.stats(collection).await?;
            if stats.indexed {
                info!(existing_count = stats.total_documents, "corpus already indexed");
                return Ok(IndexOutcome {
                    indexed_count: stats.total_documents,
                    skipped: true,
                    version: stats.version,
                });
            }
        }

        let cleaned = Document { text: clean_text(&document.text), ..document.clone() };
        let chunks = self.chunker.chunk(&cleaned);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();

        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(provider = self.embedding_provider.name(), error = %e, "embedding failed during indexing");
            RagError::Embedding(e)
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::VectorStore {
                backend: self.vector_store.backend().to_string(),
                message: format!(
                    "embedding provider returned {} vectors for {} chunks",
                    embeddings.len(),
                    chunks.len()
                ),
            });
        }

        let chunk_count = chunks.len();
        let outcome =
            self.vector_store.index(collection, chunks, embeddings, force_reindex).await?;
        info!(chunk_count, version = outcome.version, "indexed document");
        Ok(outcome)
    }

    /// Statistics for the configured collection.
    pub async fn stats(&self) -> Result<CollectionStats> {
        self.vector_store.stats(self.collection()).await
    }

    /// A retriever over the configured collection.
    pub fn retriever(&self) -> Retriever {
        Retriever::from_config(
            self.embedding_provider.clone(),
            self.vector_store.clone(),
            &self.config,
        )
    }
}

/// Builder for constructing an [`IndexingPipeline`].
///
/// The chunker defaults to a [`FixedSizeChunker`] built from the config.
#[derive(Default)]
pub struct IndexingPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl IndexingPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`IndexingPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the provider or store is missing or
    /// the default chunker cannot be built from the config.
    pub fn build(self) -> Result<IndexingPipeline> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::from_config(&config)?),
        };

        Ok(IndexingPipeline { config, embedding_provider, vector_store, chunker })
    }
}
