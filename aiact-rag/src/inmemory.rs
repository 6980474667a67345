//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` of immutable, reference-counted collections behind a
//! `tokio::sync::RwLock`. Re-indexing builds the replacement collection
//! without holding the map lock and then swaps the `Arc` in one short write,
//! so readers never block on a rebuild and never see half of one.
//!
//! A store opened with [`InMemoryVectorStore::open`] writes a JSON snapshot
//! of every change before the change becomes visible, which lets separate
//! processes share one indexed corpus. A failed write leaves both the
//! served collections and the file on the previous generation.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::document::{Chunk, RetrievedContext, ScoredChunk};
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionStats, IndexOutcome, VectorStore};

const BACKEND: &str = "InMemory";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// One immutable generation of a collection. Entries keep insertion order.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    version: u64,
    dimensions: Option<usize>,
    entries: Vec<Entry>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    collections: BTreeMap<&'a str, &'a Collection>,
}

#[derive(Deserialize)]
struct Snapshot {
    collections: HashMap<String, Collection>,
}

/// An in-memory vector store using cosine similarity for search.
///
/// # Example
///
/// ```rust,ignore
/// use aiact_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::open("./data/vector_store.json").await?;
/// let stats = store.stats("eu_ai_act").await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Arc<Collection>>>,
    /// Serialises writers; readers only ever take the map's read lock.
    writer: Mutex<()>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store persisted at `path`, loading the snapshot if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the file cannot be read and
    /// [`RagError::VectorStore`] if it is not a valid snapshot.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let collections = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
                    error!(path = %path.display(), error = %e, "invalid vector store snapshot");
                    store_error(format!("invalid snapshot '{}': {e}", path.display()))
                })?;
                info!(
                    path = %path.display(),
                    collections = snapshot.collections.len(),
                    "loaded vector store snapshot"
                );
                snapshot.collections.into_iter().map(|(name, c)| (name, Arc::new(c))).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            collections: RwLock::new(collections),
            writer: Mutex::new(()),
            snapshot_path: Some(path),
        })
    }

    /// Current generation of `collection`, if any.
    async fn current(&self, collection: &str) -> Option<Arc<Collection>> {
        self.collections.read().await.get(collection).cloned()
    }

    /// Write `collections` to the snapshot file via a temporary file and a
    /// rename. No-op for stores without a snapshot path.
    async fn persist(&self, collections: &HashMap<String, Arc<Collection>>) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let snapshot = SnapshotRef {
            collections: collections.iter().map(|(k, v)| (k.as_str(), v.as_ref())).collect(),
        };
        let bytes = serde_json::to_vec(&snapshot)
            .map_err(|e| store_error(format!("failed to serialise snapshot: {e}")))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote vector store snapshot");
        Ok(())
    }

    /// Persist `next`, then make it the served state.
    ///
    /// Callers hold the writer lock, so `next` cannot race another change.
    async fn commit(&self, next: HashMap<String, Arc<Collection>>) -> Result<()> {
        if let Err(e) = self.persist(&next).await {
            error!(error = %e, "snapshot write failed, keeping previous generation");
            return Err(e);
        }
        *self.collections.write().await = next;
        Ok(())
    }
}

fn store_error(message: String) -> RagError {
    RagError::VectorStore { backend: BACKEND.to_string(), message }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the result is not finite.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let similarity = dot / (norm_a * norm_b);
    if similarity.is_finite() { similarity } else { 0.0 }
}

/// Common dimensionality of `embeddings`.
fn shared_dimensions(embeddings: &[Vec<f32>]) -> Result<Option<usize>> {
    let Some(first) = embeddings.first() else {
        return Ok(None);
    };
    let expected = first.len();
    if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
        return Err(RagError::DimensionMismatch { expected, actual: bad.len() });
    }
    Ok(Some(expected))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn index(
        &self,
        collection: &str,
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
        force_reindex: bool,
    ) -> Result<IndexOutcome> {
        if chunks.len() != embeddings.len() {
            return Err(store_error(format!(
                "{} chunks but {} embeddings for collection '{collection}'",
                chunks.len(),
                embeddings.len()
            )));
        }
        let dimensions = shared_dimensions(&embeddings)?;

        let _writer = self.writer.lock().await;
        let previous = self.current(collection).await;

        if let Some(existing) = previous.as_ref().filter(|c| !c.entries.is_empty()) {
            if !force_reindex {
                info!(
                    collection,
                    existing_count = existing.entries.len(),
                    "collection already indexed, skipping"
                );
                return Ok(IndexOutcome {
                    indexed_count: existing.entries.len(),
                    skipped: true,
                    version: existing.version,
                });
            }
        }

        // Built without touching the map lock; readers keep using `previous`.
        let version = previous.as_ref().map_or(0, |c| c.version) + 1;
        let entries: Vec<Entry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Entry { chunk, embedding })
            .collect();
        let indexed_count = entries.len();
        let replacement = Arc::new(Collection { version, dimensions, entries });

        let mut next = self.collections.read().await.clone();
        next.insert(collection.to_string(), replacement);
        self.commit(next).await?;
        info!(collection, indexed_count, version, "collection indexed");

        Ok(IndexOutcome { indexed_count, skipped: false, version })
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<RetrievedContext> {
        let Some(snapshot) = self.current(collection).await else {
            debug!(collection, "query against missing collection");
            return Ok(RetrievedContext::empty());
        };
        if snapshot.entries.is_empty() || top_k == 0 {
            return Ok(RetrievedContext::empty());
        }
        if let Some(expected) = snapshot.dimensions {
            if expected != embedding.len() {
                return Err(RagError::DimensionMismatch { expected, actual: embedding.len() });
            }
        }

        let mut scored: Vec<ScoredChunk> = snapshot
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, embedding),
            })
            .collect();

        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(RetrievedContext::new(scored))
    }

    async fn stats(&self, collection: &str) -> Result<CollectionStats> {
        Ok(match self.current(collection).await {
            Some(c) => CollectionStats {
                collection: collection.to_string(),
                total_documents: c.entries.len(),
                indexed: !c.entries.is_empty(),
                version: c.version,
                dimensions: c.dimensions,
            },
            None => CollectionStats::missing(collection),
        })
    }

    async fn delete_collection(&self, collection: &str) -> Result<bool> {
        let _writer = self.writer.lock().await;
        let mut next = self.collections.read().await.clone();
        if next.remove(collection).is_none() {
            return Ok(false);
        }
        self.commit(next).await?;
        info!(collection, "collection deleted");
        Ok(true)
    }
}
