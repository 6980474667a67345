//! Scores attached to a completed analysis.

use serde::{Deserialize, Serialize};

/// Clamp a score into `[0, 1]`, mapping NaN to 0.
fn unit(score: f64) -> f64 {
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}

/// Heuristic RAG evaluation scores, each in `[0, 1]`.
///
/// `overall_score` is always the unweighted mean of the four sub-metrics;
/// build values through [`EvaluationMetrics::new`] to keep that true.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EvaluationMetrics {
    pub faithfulness: f64,
    pub answer_relevance: f64,
    pub context_precision: f64,
    pub context_recall: f64,
    pub overall_score: f64,
}

impl EvaluationMetrics {
    /// Clamp the four sub-metrics and derive the overall score.
    pub fn new(
        faithfulness: f64,
        answer_relevance: f64,
        context_precision: f64,
        context_recall: f64,
    ) -> Self {
        let faithfulness = unit(faithfulness);
        let answer_relevance = unit(answer_relevance);
        let context_precision = unit(context_precision);
        let context_recall = unit(context_recall);
        let overall_score =
            (faithfulness + answer_relevance + context_precision + context_recall) / 4.0;
        Self { faithfulness, answer_relevance, context_precision, context_recall, overall_score }
    }
}

/// Verdict of the LLM-as-judge call.
///
/// Advisory only: it never feeds back into the [`ProjectAnalysis`](crate::ProjectAnalysis)
/// it judged. `overall_score` is the unweighted mean of the three sub-scores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JudgeResult {
    pub accuracy_score: f64,
    pub completeness_score: f64,
    pub consistency_score: f64,
    pub overall_score: f64,
    /// Free-text justification from the judge model.
    pub reasoning: String,
}

impl JudgeResult {
    /// Clamp the three sub-scores and derive the overall score.
    pub fn new(
        accuracy_score: f64,
        completeness_score: f64,
        consistency_score: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        let accuracy_score = unit(accuracy_score);
        let completeness_score = unit(completeness_score);
        let consistency_score = unit(consistency_score);
        let overall_score = (accuracy_score + completeness_score + consistency_score) / 3.0;
        Self {
            accuracy_score,
            completeness_score,
            consistency_score,
            overall_score,
            reasoning: reasoning.into(),
        }
    }
}
