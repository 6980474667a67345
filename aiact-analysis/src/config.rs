//! Configuration for analysis runs.

use std::time::Duration;

use aiact_core::RetryPolicy;
use aiact_eval::JudgeConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Settings for the extraction pipeline and the job worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Leading characters of the document used to build the retrieval query.
    pub query_snippet_chars: usize,
    /// Characters of the document included in the generation prompt.
    pub document_budget_chars: usize,
    /// Per-attempt bound on every provider call.
    pub generation_timeout: Duration,
    pub retry: RetryPolicy,
    /// Wall-clock limit for a whole job, enforced by the watchdog.
    pub job_budget: Duration,
    pub judge_enabled: bool,
    /// Refuse to start jobs while the collection is empty.
    pub require_indexed_corpus: bool,
    /// Cancel jobs whose status has not been read for this long.
    pub abandon_after: Option<Duration>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub judge: JudgeConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            query_snippet_chars: 500,
            document_budget_chars: 8000,
            generation_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            job_budget: Duration::from_secs(300),
            judge_enabled: true,
            require_indexed_corpus: true,
            abandon_after: None,
            temperature: 0.3,
            max_tokens: 2000,
            judge: JudgeConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }
}

/// Builder for a validated [`AnalysisConfig`].
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn query_snippet_chars(mut self, chars: usize) -> Self {
        self.config.query_snippet_chars = chars;
        self
    }

    pub fn document_budget_chars(mut self, chars: usize) -> Self {
        self.config.document_budget_chars = chars;
        self
    }

    /// Set the timeout applied to each provider attempt. The judge uses the
    /// same value.
    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.config.generation_timeout = timeout;
        self.config.judge.timeout = timeout;
        self
    }

    /// Set the retry policy for extraction and judge calls.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self.config.judge.retry = retry;
        self
    }

    pub fn job_budget(mut self, budget: Duration) -> Self {
        self.config.job_budget = budget;
        self
    }

    pub fn judge_enabled(mut self, enabled: bool) -> Self {
        self.config.judge_enabled = enabled;
        self
    }

    pub fn require_indexed_corpus(mut self, required: bool) -> Self {
        self.config.require_indexed_corpus = required;
        self
    }

    pub fn abandon_after(mut self, after: Duration) -> Self {
        self.config.abandon_after = Some(after);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set the judge prompt and sampling settings.
    ///
    /// Only the excerpt size, chunk count, temperature and token limit are
    /// taken from `judge`. The judge's timeout and retry policy always follow
    /// [`generation_timeout`](Self::generation_timeout) and
    /// [`retry`](Self::retry), whatever order the calls come in.
    pub fn judge(mut self, judge: JudgeConfig) -> Self {
        self.config.judge = JudgeConfig {
            timeout: self.config.judge.timeout,
            retry: self.config.judge.retry,
            ..judge
        };
        self
    }

    /// Build the [`AnalysisConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] for zero character budgets, zero
    /// timeouts, a job budget shorter than one provider call, or a
    /// temperature outside `0.0..=2.0`.
    pub fn build(self) -> Result<AnalysisConfig> {
        let config = self.config;
        if config.query_snippet_chars == 0 || config.document_budget_chars == 0 {
            return Err(AnalysisError::Config("character budgets must be greater than zero".into()));
        }
        if config.generation_timeout.is_zero() || config.job_budget.is_zero() {
            return Err(AnalysisError::Config("timeouts must be greater than zero".into()));
        }
        if config.job_budget < config.generation_timeout {
            return Err(AnalysisError::Config(format!(
                "job_budget ({:?}) must not be shorter than generation_timeout ({:?})",
                config.job_budget, config.generation_timeout
            )));
        }
        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(AnalysisError::Config("temperature must be within 0.0..=2.0".into()));
        }
        if config.abandon_after.is_some_and(|after| after.is_zero()) {
            return Err(AnalysisError::Config("abandon_after must be greater than zero".into()));
        }
        Ok(config)
    }
}
