//! Data types for documents, chunks, and retrieval results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for deterministic chunk identifiers.
const CHUNK_NAMESPACE: Uuid = Uuid::from_u128(0x6f1d_2c3a_9b4e_4e57_8a10_5d2f_e0c4_7a91);

/// A source document: extracted text plus identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Optional URI pointing to the original source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), source_uri: None }
    }

    pub fn with_source_uri(mut self, uri: impl Into<String>) -> Self {
        self.source_uri = Some(uri.into());
        self
    }
}

/// Metadata recorded for each chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// First article cited in the chunk, normalised to `Article <n>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_ref: Option<String>,
    /// 1-based page, when the source carries form-feed page breaks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Position of the chunk within its document.
    pub chunk_index: usize,
    /// Number of chunks the document was split into.
    pub total_chunks: usize,
}

/// A contiguous slice of a [`Document`].
///
/// Immutable once created. `id` is derived from the document id, the
/// character offset and the character length, so re-chunking the same text
/// yields the same ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    pub text: String,
    /// Offset of the first character, counted in characters.
    pub source_offset: usize,
    /// Length in characters.
    pub length: usize,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Deterministic id for a chunk at `offset` with `length` characters.
    pub fn stable_id(document_id: &str, offset: usize, length: usize) -> String {
        let key = format!("{document_id}:{offset}:{length}");
        Uuid::new_v5(&CHUNK_NAMESPACE, key.as_bytes()).to_string()
    }

    /// Character offset one past the end of this chunk.
    pub fn end_offset(&self) -> usize {
        self.source_offset + self.length
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}

/// Ordered retrieval results, most similar first.
///
/// May be empty: an unindexed collection or a failed retrieval produces an
/// empty context rather than an error, and downstream code treats that as a
/// degraded but valid input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RetrievedContext {
    pub entries: Vec<ScoredChunk>,
}

impl RetrievedContext {
    pub fn new(entries: Vec<ScoredChunk>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredChunk> {
        self.entries.iter()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|entry| &entry.chunk)
    }

    /// Keep only the first `n` entries.
    pub fn truncated(&self, n: usize) -> Self {
        Self { entries: self.entries.iter().take(n).cloned().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_is_deterministic() {
        let a = Chunk::stable_id("eu_ai_act", 800, 1000);
        let b = Chunk::stable_id("eu_ai_act", 800, 1000);
        let c = Chunk::stable_id("eu_ai_act", 800, 999);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
