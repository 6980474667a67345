//! Error types for the `aiact-rag` crate.

use aiact_core::ModelError;
use thiserror::Error;

/// Errors that can occur in RAG operations.
///
/// An empty or missing collection is not an error: queries against it return
/// an empty [`RetrievedContext`](crate::RetrievedContext).
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding provider failed. Kept apart from store failures so
    /// callers can retry or degrade.
    #[error("Embedding error: {0}")]
    Embedding(#[from] ModelError),

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// Vectors of different sizes were mixed in one collection or query.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading or writing a store snapshot failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Whether the failure came from a transient embedding-provider error.
    pub fn is_transient(&self) -> bool {
        matches!(self, RagError::Embedding(e) if e.is_transient())
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
