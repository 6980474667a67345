//! Analysis jobs and their lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AnalysisError, Result};
use crate::report::AnalysisReport;

/// Identifier returned by [`start_analysis`](crate::AnalysisService::start_analysis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// `pending -> processing -> completed | failed`.
///
/// A pending job may also fail directly (cancelled before it started).
/// Terminal states are final.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed { report: Box<AnalysisReport> },
    Failed { message: String },
}

impl JobStatus {
    pub fn name(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed { .. } => "completed",
            JobStatus::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Failed { .. })
    }

    pub fn failed(message: impl Into<String>) -> Self {
        JobStatus::Failed { message: message.into() }
    }

    fn can_become(&self, next: &JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Pending, JobStatus::Failed { .. })
                | (JobStatus::Processing, JobStatus::Completed { .. })
                | (JobStatus::Processing, JobStatus::Failed { .. })
        )
    }
}

/// One document analysis tracked from upload to a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisJob {
    pub id: JobId,
    pub document_id: String,
    #[serde(flatten)]
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Last time a client read the job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_polled_at: Option<DateTime<Utc>>,
}

impl AnalysisJob {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            document_id: document_id.into(),
            status: JobStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            last_polled_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match &self.status {
            JobStatus::Completed { report } => Some(report.as_ref()),
            _ => None,
        }
    }

    /// Move to `next`, stamping the matching timestamp.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidTransition`] when the lifecycle forbids the
    /// change, in particular any change out of a terminal state.
    pub fn transition(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_become(&next) {
            return Err(AnalysisError::InvalidTransition {
                job_id: self.id,
                from: self.status.name(),
                to: next.name(),
            });
        }
        let now = Utc::now();
        match next {
            JobStatus::Processing => self.started_at = Some(now),
            JobStatus::Completed { .. } | JobStatus::Failed { .. } => self.completed_at = Some(now),
            JobStatus::Pending => {}
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_moves_forward_only() {
        let mut job = AnalysisJob::new("doc-1");
        assert!(job.transition(JobStatus::Processing).is_ok());
        assert!(job.started_at.is_some());
        assert!(job.transition(JobStatus::Pending).is_err());
        assert!(job.transition(JobStatus::failed("boom")).is_ok());
        assert!(job.completed_at.is_some());

        let err = job.transition(JobStatus::Processing).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidTransition { from: "failed", to: "processing", .. }
        ));
        assert_eq!(job.status, JobStatus::failed("boom"));
    }

    #[test]
    fn pending_can_fail_and_processing_cannot_restart() {
        let mut job = AnalysisJob::new("doc-1");
        assert!(job.transition(JobStatus::failed("cancelled")).is_ok());
        assert!(job.started_at.is_none());

        let mut job = AnalysisJob::new("doc-2");
        job.transition(JobStatus::Processing).unwrap();
        assert!(job.transition(JobStatus::Processing).is_err());
    }

    #[test]
    fn job_id_round_trips_through_display() {
        let id = JobId::new();
        assert_eq!(id.to_string().parse::<JobId>().unwrap(), id);
        assert!("not-a-uuid".parse::<JobId>().is_err());
    }

    #[test]
    fn serializes_status_inline() {
        let job = AnalysisJob::new("doc-1");
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["document_id"], "doc-1");
    }
}
