//! Error types for the `aiact-eval` crate.

use aiact_core::ModelError;
use thiserror::Error;

/// Errors that can occur while judging an analysis.
///
/// The heuristic metrics cannot fail; only the judge call can.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    /// The judge model call failed.
    #[error("Judge provider error: {0}")]
    Provider(#[from] ModelError),

    /// The judge prompt could not be built from the analysis.
    #[error("Judge prompt error: {0}")]
    Prompt(String),

    /// The judge answered, but not with a valid verdict, even after a re-prompt.
    #[error("Malformed judge output: {0}")]
    MalformedJudgeOutput(String),
}

/// A convenience result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
