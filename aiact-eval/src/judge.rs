//! LLM-as-judge: a second, independent model call that grades an analysis.
//!
//! The verdict is advisory. It is attached to the report next to the
//! analysis and never changes it.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use aiact_core::{
    GenerationProvider, GenerationRequest, JudgeResult, ModelError, ProjectAnalysis, RetryPolicy,
    parse_validated, truncate_chars,
};
use aiact_rag::RetrievedContext;
use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};

use crate::error::{EvalError, Result};

const SYSTEM_PROMPT: &str = "You are an expert evaluator. Respond only with valid JSON.";

const STRICT_SUFFIX: &str = "Your previous reply could not be used. Reply with exactly one JSON \
object with the numeric fields accuracy_score, completeness_score and consistency_score (each \
between 0.0 and 1.0) and a non-empty string field reasoning. No markdown, no other text.";

/// Settings for the judge call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JudgeConfig {
    /// Characters of the source document shown to the judge.
    pub document_excerpt_chars: usize,
    /// Number of top retrieved chunks shown to the judge.
    pub context_chunks: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-attempt time budget.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            document_excerpt_chars: 4000,
            context_chunks: 3,
            temperature: 0.2,
            max_tokens: 1000,
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

static VERDICT_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new(&verdict_schema()).expect("unreachable error: verdict schema is valid")
});

#[derive(Debug, Deserialize)]
struct RawVerdict {
    accuracy_score: f64,
    completeness_score: f64,
    consistency_score: f64,
    reasoning: String,
}

/// Grades an analysis for accuracy, completeness and consistency.
///
/// # Example
///
/// ```rust,ignore
/// use aiact_eval::LlmJudge;
///
/// let judge = LlmJudge::new(Arc::new(client));
/// let verdict = judge.judge(&context, &analysis, &document_text).await?;
/// println!("{:.2}: {}", verdict.overall_score, verdict.reasoning);
/// ```
pub struct LlmJudge {
    provider: Arc<dyn GenerationProvider>,
    config: JudgeConfig,
}

impl LlmJudge {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { provider, config: JudgeConfig::default() }
    }

    pub fn with_config(mut self, config: JudgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    /// Ask the judge model for a verdict.
    ///
    /// An unparseable answer gets one stricter re-prompt before
    /// [`EvalError::MalformedJudgeOutput`] is returned.
    #[instrument(skip_all, fields(provider = self.provider.name(), project = %analysis.project_name))]
    pub async fn judge(
        &self,
        context: &RetrievedContext,
        analysis: &ProjectAnalysis,
        source_text: &str,
    ) -> Result<JudgeResult> {
        let prompt = self.prompt(context, analysis, source_text)?;

        let first = self.call(&prompt).await?;
        let reason = match parse_verdict(&first) {
            Ok(verdict) => {
                info!(overall = verdict.overall_score, "judge verdict");
                return Ok(verdict);
            }
            Err(reason) => reason,
        };

        warn!(%reason, "judge output malformed, re-prompting");
        let strict = format!("{prompt}\n\n{STRICT_SUFFIX}");
        let second = self.call(&strict).await?;
        parse_verdict(&second)
            .inspect(|verdict| info!(overall = verdict.overall_score, "judge verdict after re-prompt"))
            .map_err(|reason| {
                error!(%reason, "judge output malformed after re-prompt");
                EvalError::MalformedJudgeOutput(reason)
            })
    }

    async fn call(&self, prompt: &str) -> Result<String> {
        let request = GenerationRequest::new(SYSTEM_PROMPT, prompt)
            .with_schema(verdict_schema())
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);
        let provider = self.provider.clone();

        let text = self
            .config
            .retry
            .run(self.provider.name(), self.config.timeout, || {
                let provider = provider.clone();
                let request = request.clone();
                async move { provider.generate(request).await }
            })
            .await?;
        Ok(text)
    }

    fn prompt(
        &self,
        context: &RetrievedContext,
        analysis: &ProjectAnalysis,
        source_text: &str,
    ) -> Result<String> {
        let excerpt = truncate_chars(source_text, self.config.document_excerpt_chars);
        let context = context
            .chunks()
            .take(self.config.context_chunks)
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let analysis = pretty_json(analysis)?;

        Ok(format!(
            "You are evaluating the quality of an AI compliance analysis.\n\n\
             **Original Technical Document (excerpt):**\n{excerpt}\n\n\
             **EU AI Act Context:**\n{context}\n\n\
             **Analysis Result to Evaluate:**\n{analysis}\n\n\
             **Evaluation Criteria:**\n\
             1. **Accuracy (0-1)**: Are the identified AI components and risks accurate?\n\
             2. **Completeness (0-1)**: Did the analysis cover all relevant aspects?\n\
             3. **Consistency (0-1)**: Are the risk classifications consistent with the EU AI Act?\n\n\
             Respond with a JSON object:\n\
             {{\"accuracy_score\": 0.0-1.0, \"completeness_score\": 0.0-1.0, \
             \"consistency_score\": 0.0-1.0, \"reasoning\": \"explanation of the scores\"}}"
        ))
    }
}

fn pretty_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        error!(error = %e, "analysis could not be serialised for the judge");
        EvalError::Prompt(format!("analysis could not be serialised: {e}"))
    })
}

fn verdict_schema() -> Value {
    json!({
        "type": "object",
        "required": ["accuracy_score", "completeness_score", "consistency_score", "reasoning"],
        "properties": {
            "accuracy_score": {"type": "number", "minimum": 0, "maximum": 1},
            "completeness_score": {"type": "number", "minimum": 0, "maximum": 1},
            "consistency_score": {"type": "number", "minimum": 0, "maximum": 1},
            "reasoning": {"type": "string", "pattern": "\\S"}
        }
    })
}

/// Strictly parse and validate a verdict; the overall score is recomputed.
fn parse_verdict(text: &str) -> std::result::Result<JudgeResult, String> {
    let raw: RawVerdict = parse_validated(text, &VERDICT_VALIDATOR).map_err(|e| match e {
        ModelError::MalformedOutput(reason) => reason,
        other => other.to_string(),
    })?;

    Ok(JudgeResult::new(
        raw.accuracy_score,
        raw.completeness_score,
        raw.consistency_score,
        raw.reasoning.trim(),
    ))
}
