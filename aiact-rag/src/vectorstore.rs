//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, RetrievedContext};
use crate::error::Result;

/// Result of an [`VectorStore::index`] call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Number of chunks the collection holds afterwards.
    pub indexed_count: usize,
    /// True when the call was a no-op because the collection already had entries.
    pub skipped: bool,
    /// Collection version after the call.
    pub version: u64,
}

/// Summary of one collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionStats {
    pub collection: String,
    /// Number of indexed chunks.
    pub total_documents: usize,
    /// Whether the collection holds at least one chunk.
    pub indexed: bool,
    /// Bumped on every replacement; 0 for a collection that was never indexed.
    pub version: u64,
    /// Embedding dimensionality shared by every entry.
    pub dimensions: Option<usize>,
}

impl CollectionStats {
    /// Stats of a collection that does not exist.
    pub fn missing(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            total_documents: 0,
            indexed: false,
            version: 0,
            dimensions: None,
        }
    }
}

/// A storage backend for chunk embeddings with similarity search.
///
/// Implementations manage named collections of ([`Chunk`], embedding) pairs
/// where every embedding in a collection has the same dimensionality.
///
/// Replacing a collection must be atomic with respect to readers: a
/// concurrent [`query`](VectorStore::query) sees either the old contents or
/// the new ones, never a mix.
///
/// # Example
///
/// ```rust,ignore
/// use aiact_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.index("eu_ai_act", chunks, embeddings, false).await?;
/// let context = store.query("eu_ai_act", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name used in logs and errors.
    fn backend(&self) -> &str;

    /// Store `chunks` with their `embeddings` (matched by position).
    ///
    /// When `force_reindex` is false and the collection already has entries,
    /// nothing changes and the existing count is reported. Otherwise the
    /// collection's contents are replaced as a whole.
    async fn index(
        &self,
        collection: &str,
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
        force_reindex: bool,
    ) -> Result<IndexOutcome>;

    /// The `top_k` chunks most similar to `embedding`, highest first.
    ///
    /// Ties keep insertion order. A missing or empty collection yields an
    /// empty context.
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<RetrievedContext>;

    /// Statistics for `collection`; a missing collection reports zero entries.
    async fn stats(&self, collection: &str) -> Result<CollectionStats>;

    /// Remove a collection. Returns whether it existed.
    async fn delete_collection(&self, collection: &str) -> Result<bool>;
}
