//! Background analysis jobs.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use aiact_core::GenerationProvider;
use aiact_eval::{LlmJudge, RagEvaluator};
use aiact_rag::{CollectionStats, Retriever};
use chrono::Utc;
use futures::FutureExt;
use tokio::task::AbortHandle;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::job::{AnalysisJob, JobId, JobStatus};
use crate::pipeline::RiskExtractionPipeline;
use crate::report::AnalysisReport;
use crate::store::{InMemoryJobStore, JobStore};

/// Message stored on jobs stopped through [`AnalysisService::cancel`].
pub const CANCELLED_MESSAGE: &str = "cancelled";

const ABANDON_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Entry point for the API layer: start jobs, read them, cancel them.
///
/// Each job runs on its own tokio task: extraction first, then the
/// heuristic metrics and the judge concurrently. A watchdog bounds the whole
/// job by [`AnalysisConfig::job_budget`], so no job stays `processing`.
///
/// # Example
///
/// ```rust,ignore
/// use aiact_analysis::AnalysisService;
///
/// let service = AnalysisService::builder()
///     .retriever(retriever)
///     .generator(Arc::new(client))
///     .build()?;
///
/// let job_id = service.start_analysis("doc-1", text).await?;
/// let job = service.get_job(job_id).await?;
/// ```
#[derive(Clone)]
pub struct AnalysisService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    pipeline: RiskExtractionPipeline,
    evaluator: RagEvaluator,
    judge: Option<LlmJudge>,
    store: Arc<dyn JobStore>,
    tasks: Mutex<HashMap<JobId, AbortHandle>>,
}

impl AnalysisService {
    pub fn builder() -> AnalysisServiceBuilder {
        AnalysisServiceBuilder::default()
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.inner.pipeline.config()
    }

    pub fn job_store(&self) -> &Arc<dyn JobStore> {
        &self.inner.store
    }

    /// Create a pending job and start processing it in the background.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::CollectionNotIndexed`] when the corpus is empty and
    /// [`AnalysisConfig::require_indexed_corpus`] is set. No job is created
    /// in that case.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn start_analysis(&self, document_id: &str, text: &str) -> Result<JobId> {
        if self.config().require_indexed_corpus {
            let stats = self.corpus_stats().await?;
            if !stats.indexed {
                warn!(collection = %stats.collection, "analysis refused, corpus not indexed");
                return Err(AnalysisError::CollectionNotIndexed { collection: stats.collection });
            }
        }

        let job = AnalysisJob::new(document_id);
        let id = job.id;
        self.inner.store.create(job).await?;

        let inner = self.inner.clone();
        let document_id = document_id.to_string();
        let text = text.to_string();
        let span = info_span!("analysis_job", job_id = %id, document_id = %document_id);

        let mut tasks = self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = tokio::spawn(inner.run_job(id, document_id, text).instrument(span));
        tasks.insert(id, handle.abort_handle());
        drop(tasks);

        info!(job_id = %id, "analysis job started");
        Ok(id)
    }

    /// Read a job, recording the poll.
    pub async fn get_job(&self, id: JobId) -> Result<AnalysisJob> {
        self.inner.store.touch(id).await
    }

    /// Abort a job's task and mark it failed.
    ///
    /// A job that already reached a terminal state is returned unchanged.
    pub async fn cancel(&self, id: JobId) -> Result<AnalysisJob> {
        self.inner.cancel(id, CANCELLED_MESSAGE).await
    }

    /// Statistics of the collection analyses are grounded on.
    pub async fn corpus_stats(&self) -> Result<CollectionStats> {
        let retriever = self.inner.pipeline.retriever();
        Ok(retriever.vector_store().stats(retriever.collection()).await?)
    }

    /// Number of jobs whose task is still running.
    pub fn active_jobs(&self) -> usize {
        self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl ServiceInner {
    async fn run_job(self: Arc<Self>, id: JobId, document_id: String, text: String) {
        if let Err(e) = self.store.update_status(id, JobStatus::Processing).await {
            // cancelled before the task got scheduled
            debug!(error = %e, "job not started");
            self.forget(id);
            return;
        }

        let config = self.pipeline.config();
        let budget = config.job_budget;
        let work = AssertUnwindSafe(self.process(&document_id, &text)).catch_unwind();

        let status = tokio::select! {
            outcome = tokio::time::timeout(budget, work) => match outcome {
                Ok(Ok(Ok(report))) => JobStatus::Completed { report: Box::new(report) },
                Ok(Ok(Err(e))) => {
                    error!(error = %e, "analysis failed");
                    JobStatus::failed(e.to_string())
                }
                Ok(Err(_)) => {
                    error!("analysis task panicked");
                    JobStatus::failed("analysis task panicked")
                }
                Err(_) => {
                    error!(budget_secs = budget.as_secs_f64(), "analysis exceeded its time budget");
                    JobStatus::failed(format!(
                        "analysis exceeded its time budget of {:.1}s",
                        budget.as_secs_f64()
                    ))
                }
            },
            after = self.abandoned(id) => {
                warn!(idle_secs = after.as_secs_f64(), "job abandoned by its client");
                JobStatus::failed(format!(
                    "abandoned: not polled for {:.1}s",
                    after.as_secs_f64()
                ))
            }
        };

        match self.store.update_status(id, status).await {
            Ok(job) => info!(status = job.status.name(), "analysis job finished"),
            Err(e) => debug!(error = %e, "job already finished elsewhere"),
        }
        self.forget(id);
    }

    async fn process(&self, document_id: &str, text: &str) -> Result<AnalysisReport> {
        let output = self.pipeline.run(document_id, text).await?;

        let metrics = async { self.evaluator.evaluate(&output.context, &output.analysis, text) };
        let verdict = async {
            match &self.judge {
                Some(judge) => Some(judge.judge(&output.context, &output.analysis, text).await),
                None => None,
            }
        };
        let (metrics, verdict) = tokio::join!(metrics, verdict);

        let (judge, judge_error) = match verdict {
            Some(Ok(result)) => (Some(result), None),
            Some(Err(e)) => {
                warn!(error = %e, "judge failed, reporting metrics only");
                (None, Some(e.to_string()))
            }
            None => (None, None),
        };

        Ok(AnalysisReport {
            document_id: document_id.to_string(),
            analysis: output.analysis,
            context: output.context,
            retrieval_status: output.retrieval_status,
            metrics,
            judge,
            judge_error,
            generation_attempts: output.generation_attempts,
        })
    }

    /// Resolves once the job has gone unread for `abandon_after`; never
    /// resolves when abandonment is disabled.
    async fn abandoned(&self, id: JobId) -> Duration {
        let Some(limit) = self.pipeline.config().abandon_after else {
            return std::future::pending().await;
        };
        let interval = limit.min(ABANDON_CHECK_INTERVAL);
        loop {
            tokio::time::sleep(interval).await;
            let Ok(job) = self.store.get(id).await else {
                return std::future::pending().await;
            };
            let last_seen = job.last_polled_at.unwrap_or(job.created_at);
            let idle = (Utc::now() - last_seen).to_std().unwrap_or_default();
            if idle >= limit {
                return idle;
            }
        }
    }

    async fn cancel(&self, id: JobId, message: &str) -> Result<AnalysisJob> {
        let handle = self.tasks.lock().unwrap_or_else(PoisonError::into_inner).remove(&id);
        if let Some(handle) = handle {
            handle.abort();
        }

        let job = self.store.get(id).await?;
        if job.is_terminal() {
            return Ok(job);
        }
        match self.store.update_status(id, JobStatus::failed(message)).await {
            Ok(job) => {
                info!(job_id = %id, "analysis job cancelled");
                Ok(job)
            }
            // finished between the read and the update
            Err(AnalysisError::InvalidTransition { .. }) => self.store.get(id).await,
            Err(e) => Err(e),
        }
    }

    fn forget(&self, id: JobId) {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).remove(&id);
    }
}

/// Builder for [`AnalysisService`].
#[derive(Default)]
pub struct AnalysisServiceBuilder {
    config: Option<AnalysisConfig>,
    retriever: Option<Retriever>,
    generator: Option<Arc<dyn GenerationProvider>>,
    judge_provider: Option<Arc<dyn GenerationProvider>>,
    job_store: Option<Arc<dyn JobStore>>,
}

impl AnalysisServiceBuilder {
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn GenerationProvider>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Provider for the judge call. Defaults to the generator.
    pub fn judge_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.judge_provider = Some(provider);
        self
    }

    /// Job store. Defaults to an [`InMemoryJobStore`].
    pub fn job_store(mut self, store: Arc<dyn JobStore>) -> Self {
        self.job_store = Some(store);
        self
    }

    /// Build the service.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] if the retriever or generator is missing.
    pub fn build(self) -> Result<AnalysisService> {
        let config = self.config.unwrap_or_default();
        let retriever = self
            .retriever
            .ok_or_else(|| AnalysisError::Config("retriever is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| AnalysisError::Config("generator is required".to_string()))?;

        let judge = config.judge_enabled.then(|| {
            let provider = self.judge_provider.unwrap_or_else(|| generator.clone());
            LlmJudge::new(provider).with_config(config.judge.clone())
        });
        let store = self.job_store.unwrap_or_else(|| Arc::new(InMemoryJobStore::new()));

        Ok(AnalysisService {
            inner: Arc::new(ServiceInner {
                pipeline: RiskExtractionPipeline::new(retriever, generator, config),
                evaluator: RagEvaluator::new(),
                judge,
                store,
                tasks: Mutex::new(HashMap::new()),
            }),
        })
    }
}
