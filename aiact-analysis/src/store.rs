//! Job store abstraction and its in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::job::{AnalysisJob, JobId, JobStatus};

/// Persistence for [`AnalysisJob`]s, injected into the analysis service.
///
/// `update_status` must enforce the job lifecycle atomically: two racing
/// updates cannot both leave a terminal state behind.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: AnalysisJob) -> Result<()>;

    async fn get(&self, id: JobId) -> Result<AnalysisJob>;

    /// Apply a lifecycle transition and return the updated job.
    async fn update_status(&self, id: JobId, status: JobStatus) -> Result<AnalysisJob>;

    /// Record that a client read the job, returning it.
    async fn touch(&self, id: JobId) -> Result<AnalysisJob>;

    async fn list(&self) -> Result<Vec<AnalysisJob>>;
}

/// Jobs kept in a `HashMap` behind a `tokio` `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, AnalysisJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: AnalysisJob) -> Result<()> {
        debug!(job_id = %job.id, document_id = %job.document_id, "job created");
        self.jobs.write().await.insert(job.id, job);
        Ok(())
    }

    async fn get(&self, id: JobId) -> Result<AnalysisJob> {
        self.jobs.read().await.get(&id).cloned().ok_or(AnalysisError::JobNotFound(id))
    }

    async fn update_status(&self, id: JobId, status: JobStatus) -> Result<AnalysisJob> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(AnalysisError::JobNotFound(id))?;
        job.transition(status)?;
        debug!(job_id = %id, status = job.status.name(), "job status updated");
        Ok(job.clone())
    }

    async fn touch(&self, id: JobId) -> Result<AnalysisJob> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(AnalysisError::JobNotFound(id))?;
        job.last_polled_at = Some(Utc::now());
        Ok(job.clone())
    }

    async fn list(&self) -> Result<Vec<AnalysisJob>> {
        let mut jobs: Vec<AnalysisJob> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by_key(|job| job.created_at);
        Ok(jobs)
    }
}
