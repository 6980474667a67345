//! # aiact-rag
//!
//! Retrieval layer for the EU AI Act compliance analyzer.
//!
//! ## Overview
//!
//! - [`Chunker`] - splits the legislative text into overlapping windows
//!   ([`FixedSizeChunker`], [`SentenceChunker`])
//! - [`EmbeddingProvider`] - turns text into vectors
//!   ([`HashingEmbeddingProvider`], `openai::AzureOpenAIEmbeddingProvider`)
//! - [`VectorStore`] - named collections with cosine search
//!   ([`InMemoryVectorStore`], with optional JSON snapshot persistence)
//! - [`IndexingPipeline`] - clean → chunk → embed → store
//! - [`Retriever`] - embed a query and pull the top-K chunks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use aiact_rag::*;
//!
//! let pipeline = IndexingPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! pipeline.index(&Document::new("eu_ai_act", act_text), false).await?;
//! let context = pipeline.retriever().retrieve("facial recognition").await?;
//! ```
//!
//! ## Features
//!
//! - `azure` (default) - Azure OpenAI embedding provider

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod inmemory;
pub mod pipeline;
pub mod retriever;
pub mod vectorstore;

#[cfg(feature = "azure")]
pub mod openai;

pub use chunking::{Chunker, FixedSizeChunker, SentenceChunker, clean_text, detect_article_ref};
pub use config::{DEFAULT_COLLECTION, RagConfig, RagConfigBuilder};
pub use document::{Chunk, ChunkMetadata, Document, RetrievedContext, ScoredChunk};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use hashing::HashingEmbeddingProvider;
pub use inmemory::InMemoryVectorStore;
pub use pipeline::{IndexingPipeline, IndexingPipelineBuilder};
pub use retriever::{DEFAULT_TOP_K, Retriever};
pub use vectorstore::{CollectionStats, IndexOutcome, VectorStore};
