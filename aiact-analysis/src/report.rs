//! The payload of a completed job.

use std::fmt;

use aiact_core::{EvaluationMetrics, JudgeResult, ProjectAnalysis};
use aiact_rag::RetrievedContext;
use serde::{Deserialize, Serialize};

/// How well the analysis was grounded in retrieved legislation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalStatus {
    /// At least one chunk was retrieved.
    Grounded,
    /// Retrieval worked but found nothing.
    Empty,
    /// Retrieval kept failing with transient errors; the analysis ran
    /// without context.
    Degraded,
}

impl RetrievalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalStatus::Grounded => "grounded",
            RetrievalStatus::Empty => "empty",
            RetrievalStatus::Degraded => "degraded",
        }
    }
}

impl fmt::Display for RetrievalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything produced for one document.
///
/// `judge` and `judge_error` are mutually exclusive; both are absent when
/// the judge is disabled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisReport {
    pub document_id: String,
    pub analysis: ProjectAnalysis,
    /// The legislative chunks the analysis was grounded on.
    pub context: RetrievedContext,
    pub retrieval_status: RetrievalStatus,
    pub metrics: EvaluationMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge: Option<JudgeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_error: Option<String>,
    /// Generation calls made, including retries and the re-prompt.
    pub generation_attempts: u32,
}
