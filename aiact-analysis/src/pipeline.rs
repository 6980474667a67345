//! Risk extraction as explicit stages.
//!
//! ```text
//! document text --formulate_query--> query
//!               --retrieve--------> Grounding (context + status)
//!               --build_prompt----> prompt
//!               --generate--------> Extraction (analysis + attempts)
//! ```
//!
//! Each stage can be called on its own; [`RiskExtractionPipeline::run`]
//! chains them.

use std::sync::Arc;

use aiact_core::{GenerationProvider, GenerationRequest, ModelError, ProjectAnalysis};
use aiact_rag::{RagError, RetrievedContext, Retriever};
use tracing::{error, info, instrument, warn};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::prompt::{SYSTEM_PROMPT, analysis_prompt, formulate_query, strict_prompt};
use crate::report::RetrievalStatus;
use crate::schema::{analysis_schema, parse_analysis};

/// Output of the retrieval stage.
#[derive(Debug, Clone)]
pub struct Grounding {
    pub context: RetrievedContext,
    pub status: RetrievalStatus,
}

/// Output of the generation stage.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub analysis: ProjectAnalysis,
    /// Provider calls made, counting retries and the re-prompt.
    pub attempts: u32,
}

/// Output of a full run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub analysis: ProjectAnalysis,
    pub context: RetrievedContext,
    pub retrieval_status: RetrievalStatus,
    pub generation_attempts: u32,
}

/// Retrieval plus one logical generation call per document.
///
/// Transient provider errors are retried under the configured
/// [`RetryPolicy`](aiact_core::RetryPolicy). An answer that does not match
/// the schema gets one stricter re-prompt; the analysis is only ever built
/// from the final answer, so retries cannot duplicate risks.
pub struct RiskExtractionPipeline {
    retriever: Retriever,
    generator: Arc<dyn GenerationProvider>,
    config: AnalysisConfig,
}

impl RiskExtractionPipeline {
    pub fn new(
        retriever: Retriever,
        generator: Arc<dyn GenerationProvider>,
        config: AnalysisConfig,
    ) -> Self {
        Self { retriever, generator, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn formulate_query(&self, document_text: &str) -> String {
        formulate_query(document_text, self.config.query_snippet_chars)
    }

    /// Fetch legislative context for `query`.
    ///
    /// Transient embedding failures that outlast the retry policy degrade to
    /// an empty context instead of failing; anything else is an error.
    #[instrument(skip_all, fields(collection = %self.retriever.collection()))]
    pub async fn retrieve(&self, query: &str) -> Result<Grounding> {
        let retriever = &self.retriever;
        let outcome = self
            .config
            .retry
            .run("embedding", self.config.generation_timeout, || async move {
                match retriever.retrieve(query).await {
                    Ok(context) => Ok(Ok(context)),
                    Err(RagError::Embedding(e)) => Err(e),
                    Err(other) => Ok(Err(other)),
                }
            })
            .await;

        match outcome {
            Ok(Ok(context)) if context.is_empty() => {
                warn!("empty retrieval context, analysis proceeds ungrounded");
                Ok(Grounding { context, status: RetrievalStatus::Empty })
            }
            Ok(Ok(context)) => Ok(Grounding { context, status: RetrievalStatus::Grounded }),
            Ok(Err(e)) => {
                error!(error = %e, "retrieval failed");
                Err(AnalysisError::Retrieval(e))
            }
            Err(e) if e.is_transient() => {
                warn!(error = %e, "retrieval kept failing, continuing without context");
                Ok(Grounding { context: RetrievedContext::empty(), status: RetrievalStatus::Degraded })
            }
            Err(e) => {
                error!(error = %e, "retrieval failed");
                Err(AnalysisError::Retrieval(RagError::Embedding(e)))
            }
        }
    }

    pub fn build_prompt(&self, grounding: &Grounding, document_text: &str) -> String {
        analysis_prompt(&grounding.context, document_text, self.config.document_budget_chars)
    }

    /// Ask the model for an analysis and parse it strictly.
    pub async fn generate(&self, prompt: &str) -> Result<Extraction> {
        let mut attempts = 0;

        let first = self.call(prompt, &mut attempts).await?;
        let reason = match parse_analysis(&first) {
            Ok(analysis) => return Ok(Extraction { analysis, attempts }),
            Err(e) => malformed_reason(e),
        };

        warn!(%reason, "model output malformed, re-prompting");
        let second = self.call(&strict_prompt(prompt, &reason), &mut attempts).await?;
        match parse_analysis(&second) {
            Ok(analysis) => Ok(Extraction { analysis, attempts }),
            Err(e) => {
                let reason = malformed_reason(e);
                error!(%reason, attempts, "model output malformed after re-prompt");
                Err(AnalysisError::MalformedModelOutput(reason))
            }
        }
    }

    /// Run every stage for one document.
    #[instrument(skip(self, document_text), fields(text_len = document_text.len()))]
    pub async fn run(&self, document_id: &str, document_text: &str) -> Result<PipelineOutput> {
        let query = self.formulate_query(document_text);
        let grounding = self.retrieve(&query).await?;
        let prompt = self.build_prompt(&grounding, document_text);
        let extraction = self.generate(&prompt).await?;

        info!(
            project = %extraction.analysis.project_name,
            contains_ai = extraction.analysis.contains_ai,
            high_risks = extraction.analysis.high_risk_count(),
            low_risks = extraction.analysis.low_risk_count(),
            retrieval = %grounding.status,
            attempts = extraction.attempts,
            "risk extraction complete"
        );

        Ok(PipelineOutput {
            analysis: extraction.analysis,
            context: grounding.context,
            retrieval_status: grounding.status,
            generation_attempts: extraction.attempts,
        })
    }

    async fn call(&self, prompt: &str, attempts: &mut u32) -> Result<String> {
        let request = GenerationRequest::new(SYSTEM_PROMPT, prompt)
            .with_schema(analysis_schema())
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);
        let generator = &self.generator;

        self.config
            .retry
            .run(generator.name(), self.config.generation_timeout, || {
                *attempts += 1;
                let request = request.clone();
                async move { generator.generate(request).await }
            })
            .await
            .map_err(|e| {
                error!(provider = generator.name(), error = %e, "generation failed");
                AnalysisError::Provider(e)
            })
    }
}

fn malformed_reason(error: ModelError) -> String {
    match error {
        ModelError::MalformedOutput(reason) => reason,
        other => other.to_string(),
    }
}
