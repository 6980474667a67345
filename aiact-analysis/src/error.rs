//! Error types for the `aiact-analysis` crate.

use aiact_core::ModelError;
use aiact_rag::RagError;
use thiserror::Error;

use crate::job::JobId;

/// Errors that can occur while starting, running or tracking an analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The legislative corpus has not been indexed yet. A precondition
    /// failure, reported before any job is created.
    #[error("Collection '{collection}' is not indexed")]
    CollectionNotIndexed { collection: String },

    /// Retrieval failed for a reason other than a transient embedding error.
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RagError),

    /// The generation provider failed after retries, or failed fatally.
    #[error("Provider error: {0}")]
    Provider(#[from] ModelError),

    /// The model output could not be mapped to an analysis, even after a
    /// stricter re-prompt.
    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// A status change that the job lifecycle does not allow.
    #[error("Invalid transition for job {job_id}: {from} -> {to}")]
    InvalidTransition { job_id: JobId, from: &'static str, to: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
