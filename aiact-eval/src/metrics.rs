//! Heuristic RAG metrics.
//!
//! [`RagEvaluator`] scores one analysis from the triple (retrieved context,
//! analysis, source document) with keyword overlap only. No model calls are
//! made, so the same inputs always give the same scores.

use std::collections::HashSet;

use aiact_core::{EvaluationMetrics, ProjectAnalysis, Risk};
use aiact_rag::{Chunk, RetrievedContext};
use tracing::debug;

use crate::terms::{content_terms, mentions_ai, salient_terms, tokenize};

/// Multiplier applied to answer relevance when the AI verdict agrees with
/// the keyword check on the source text.
pub const AI_AGREEMENT_BOOST: f64 = 1.2;

/// Computes [`EvaluationMetrics`] for a finished analysis.
///
/// Conventions for empty inputs differ on purpose:
///
/// - faithfulness and context recall are `1.0` when the analysis lists no
///   risks, since nothing ungrounded was claimed;
/// - context precision is `0.0` when no chunks were retrieved, since missing
///   evidence counts as the worst case rather than as a success.
#[derive(Debug, Clone, Copy, Default)]
pub struct RagEvaluator;

impl RagEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        context: &RetrievedContext,
        analysis: &ProjectAnalysis,
        source_text: &str,
    ) -> EvaluationMetrics {
        let evidence = Evidence::new(context);
        let metrics = EvaluationMetrics::new(
            self.faithfulness(&evidence, analysis),
            self.answer_relevance(analysis, source_text),
            self.context_precision(&evidence, analysis),
            self.context_recall(&evidence, analysis),
        );
        debug!(
            faithfulness = metrics.faithfulness,
            answer_relevance = metrics.answer_relevance,
            context_precision = metrics.context_precision,
            context_recall = metrics.context_recall,
            overall = metrics.overall_score,
            "computed RAG metrics"
        );
        metrics
    }

    /// Share of risks whose description has a salient term in the context.
    fn faithfulness(&self, evidence: &Evidence<'_>, analysis: &ProjectAnalysis) -> f64 {
        let total = analysis.total_risks();
        if total == 0 {
            return 1.0;
        }
        let grounded = analysis.risks().filter(|risk| evidence.grounds(risk)).count();
        ratio(grounded, total)
    }

    /// Term overlap of the description with the source, boosted when the AI
    /// verdict agrees with [`mentions_ai`].
    fn answer_relevance(&self, analysis: &ProjectAnalysis, source_text: &str) -> f64 {
        let description = content_terms(&analysis.description);
        if description.is_empty() {
            return 0.0;
        }
        let source = content_terms(source_text);
        let overlap = ratio(description.intersection(&source).count(), description.len());

        if analysis.contains_ai == mentions_ai(source_text) {
            (overlap * AI_AGREEMENT_BOOST).min(1.0)
        } else {
            overlap
        }
    }

    /// Share of chunks that carry an article reference or ground a risk.
    fn context_precision(&self, evidence: &Evidence<'_>, analysis: &ProjectAnalysis) -> f64 {
        if evidence.chunks.is_empty() {
            return 0.0;
        }
        let useful = evidence
            .chunks
            .iter()
            .filter(|chunk| {
                chunk.metadata.article_ref.is_some()
                    || analysis.risks().any(|risk| chunk_supports(chunk, risk))
            })
            .count();
        ratio(useful, evidence.chunks.len())
    }

    /// Share of risks with a cited reference or a term match in the context.
    fn context_recall(&self, evidence: &Evidence<'_>, analysis: &ProjectAnalysis) -> f64 {
        let total = analysis.total_risks();
        if total == 0 {
            return 1.0;
        }
        let supported =
            analysis.risks().filter(|risk| risk.reference().is_some() || evidence.grounds(risk)).count();
        ratio(supported, total)
    }
}

/// Retrieved chunks plus the union of their tokens.
struct Evidence<'a> {
    chunks: Vec<&'a Chunk>,
    tokens: HashSet<String>,
}

impl<'a> Evidence<'a> {
    fn new(context: &'a RetrievedContext) -> Self {
        let chunks: Vec<&Chunk> = context.chunks().collect();
        let tokens = chunks.iter().flat_map(|c| tokenize(&c.text)).collect();
        Self { chunks, tokens }
    }

    fn grounds(&self, risk: &Risk) -> bool {
        salient_terms(&risk.description).iter().any(|t| self.tokens.contains(t))
    }
}

/// Whether `chunk` backs `risk`: it contains the cited reference or shares a
/// salient term with the description.
fn chunk_supports(chunk: &Chunk, risk: &Risk) -> bool {
    if let Some(reference) = risk.reference() {
        let reference = reference.to_lowercase();
        if chunk.text.to_lowercase().contains(&reference)
            || chunk.metadata.article_ref.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(&reference))
        {
            return true;
        }
    }
    let tokens: HashSet<String> = tokenize(&chunk.text).into_iter().collect();
    salient_terms(&risk.description).iter().any(|t| tokens.contains(t))
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 / whole as f64 }
}

#[cfg(test)]
mod tests {
    use aiact_core::RiskLevel;
    use aiact_rag::{ChunkMetadata, ScoredChunk};

    use super::*;

    fn chunk(text: &str, article_ref: Option<&str>) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                id: Chunk::stable_id("act", 0, text.len()),
                document_id: "act".to_string(),
                text: text.to_string(),
                source_offset: 0,
                length: text.chars().count(),
                metadata: ChunkMetadata {
                    article_ref: article_ref.map(str::to_string),
                    ..ChunkMetadata::default()
                },
            },
            score: 0.5,
        }
    }

    fn risk(description: &str, level: RiskLevel, reference: Option<&str>) -> Risk {
        Risk {
            description: description.to_string(),
            category: "High-Risk AI".to_string(),
            level,
            eu_act_reference: reference.map(str::to_string),
            confidence_score: Some(0.8),
        }
    }

    fn analysis(description: &str, contains_ai: bool, risks: Vec<Risk>) -> ProjectAnalysis {
        ProjectAnalysis::new("Project", description, contains_ai, 0.9, risks)
    }

    #[test]
    fn zero_risks_are_vacuously_grounded() {
        let context = RetrievedContext::new(vec![chunk("unrelated text", None)]);
        let metrics =
            RagEvaluator::new().evaluate(&context, &analysis("shop", false, vec![]), "shop");
        assert_eq!(metrics.faithfulness, 1.0);
        assert_eq!(metrics.context_recall, 1.0);
    }

    #[test]
    fn empty_context_has_zero_precision() {
        let risks = vec![risk("biometric identification", RiskLevel::High, Some("Article 5"))];
        let metrics = RagEvaluator::new().evaluate(
            &RetrievedContext::empty(),
            &analysis("border system", true, risks),
            "border system",
        );
        assert_eq!(metrics.context_precision, 0.0);
        assert_eq!(metrics.faithfulness, 0.0);
        // the cited reference still counts for recall
        assert_eq!(metrics.context_recall, 1.0);
    }

    #[test]
    fn exact_values_for_mixed_grounding() {
        let context = RetrievedContext::new(vec![
            chunk("Remote biometric identification in public spaces is prohibited.", Some("Article 5")),
            chunk("Chatbots must disclose that users interact with a machine.", None),
            chunk("General provisions and definitions.", None),
            chunk("Member states shall designate authorities.", None),
        ]);
        let risks = vec![
            // grounded via "biometric"
            risk("Biometric identification of travellers", RiskLevel::High, Some("Article 5")),
            // grounded via "chatbots"
            risk("Chatbots without disclosure", RiskLevel::Low, None),
            // not grounded, no reference
            risk("Unclear liability", RiskLevel::Low, None),
        ];
        let source = "Border kiosk uses facial recognition to identify travellers.";
        let analysis =
            analysis("Kiosk identifies travellers with facial recognition", true, risks);

        let m = RagEvaluator::new().evaluate(&context, &analysis, source);

        assert_eq!(m.faithfulness, 2.0 / 3.0);
        assert_eq!(m.context_recall, 2.0 / 3.0);
        // chunk 1: article ref; chunk 2: supports the chatbot risk; others unused
        assert_eq!(m.context_precision, 0.5);
        // description terms: kiosk, identifies, travellers, facial, recognition
        // source terms contain kiosk, travellers, facial, recognition -> 4/5, boosted
        assert!((m.answer_relevance - 0.96).abs() < 1e-12);
        let expected = (2.0 / 3.0 + 0.96 + 0.5 + 2.0 / 3.0) / 4.0;
        assert!((m.overall_score - expected).abs() < 1e-12);
    }

    #[test]
    fn relevance_not_boosted_on_ai_disagreement() {
        let a = analysis("online shop checkout", true, vec![]);
        let m = RagEvaluator::new().evaluate(
            &RetrievedContext::empty(),
            &a,
            "An online shop with a checkout page and product catalogue.",
        );
        // all three terms overlap; no boost applies
        assert_eq!(m.answer_relevance, 1.0);

        let b = analysis("online shop with recommendations", true, vec![]);
        let m = RagEvaluator::new().evaluate(&RetrievedContext::empty(), &b, "An online shop.");
        // terms: online, shop, recommendations -> 2/3, no boost
        assert_eq!(m.answer_relevance, 2.0 / 3.0);
    }

    #[test]
    fn empty_description_has_zero_relevance() {
        let m = RagEvaluator::new().evaluate(
            &RetrievedContext::empty(),
            &analysis("", false, vec![]),
            "anything",
        );
        assert_eq!(m.answer_relevance, 0.0);
    }

    #[test]
    fn precision_counts_reference_matches_in_text() {
        let context = RetrievedContext::new(vec![
            chunk("as laid down in article 6 of this regulation", None),
            chunk("nothing relevant here", None),
        ]);
        let risks = vec![risk("Opaque scoring", RiskLevel::High, Some("Article 6"))];
        let m = RagEvaluator::new().evaluate(&context, &analysis("x", true, risks), "x");
        assert_eq!(m.context_precision, 0.5);
    }
}
