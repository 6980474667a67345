//! Property tests for the heuristic RAG metrics.

use aiact_core::{ProjectAnalysis, Risk, RiskLevel};
use aiact_eval::RagEvaluator;
use aiact_rag::{Chunk, ChunkMetadata, RetrievedContext, ScoredChunk};
use proptest::prelude::*;

const VOCABULARY: &[&str] = &[
    "biometric",
    "identification",
    "recognition",
    "facial",
    "border",
    "control",
    "machine",
    "learning",
    "shop",
    "checkout",
    "the",
    "and",
    "article",
    "AI",
];

fn arb_text(max_words: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::sample::select(VOCABULARY), 0..max_words)
        .prop_map(|words| words.join(" "))
}

fn arb_risk() -> impl Strategy<Value = Risk> {
    (arb_text(8), any::<bool>(), proptest::option::of(1u32..114)).prop_map(
        |(description, high, article)| Risk {
            description,
            category: "High-Risk AI".to_string(),
            level: if high { RiskLevel::High } else { RiskLevel::Low },
            eu_act_reference: article.map(|n| format!("Article {n}")),
            confidence_score: None,
        },
    )
}

fn arb_analysis() -> impl Strategy<Value = ProjectAnalysis> {
    (arb_text(12), any::<bool>(), 0.0f64..=1.0, proptest::collection::vec(arb_risk(), 0..6))
        .prop_map(|(description, contains_ai, confidence, risks)| {
            ProjectAnalysis::new("Project", description, contains_ai, confidence, risks)
        })
}

fn arb_context() -> impl Strategy<Value = RetrievedContext> {
    proptest::collection::vec((arb_text(20), proptest::option::of(1u32..114)), 0..5).prop_map(
        |chunks| {
            let entries = chunks
                .into_iter()
                .enumerate()
                .map(|(i, (text, article))| {
                    let length = text.chars().count();
                    ScoredChunk {
                        chunk: Chunk {
                            id: format!("chunk-{i}"),
                            document_id: "eu_ai_act".to_string(),
                            text,
                            source_offset: i * 100,
                            length,
                            metadata: ChunkMetadata {
                                article_ref: article.map(|n| format!("Article {n}")),
                                chunk_index: i,
                                ..ChunkMetadata::default()
                            },
                        },
                        score: 1.0 - i as f32 * 0.1,
                    }
                })
                .collect();
            RetrievedContext::new(entries)
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every metric lies in `[0, 1]` and the overall score is their mean.
    #[test]
    fn metrics_stay_within_unit_interval(
        context in arb_context(),
        analysis in arb_analysis(),
        source in arb_text(40),
    ) {
        let m = RagEvaluator::new().evaluate(&context, &analysis, &source);
        for score in [m.faithfulness, m.answer_relevance, m.context_precision, m.context_recall] {
            prop_assert!((0.0..=1.0).contains(&score), "score out of range: {score}");
        }
        let mean = (m.faithfulness + m.answer_relevance + m.context_precision + m.context_recall) / 4.0;
        prop_assert!((m.overall_score - mean).abs() < 1e-12);
    }

    /// Empty evidence always gives zero precision; zero risks are vacuously grounded.
    #[test]
    fn empty_input_conventions(analysis in arb_analysis(), source in arb_text(40)) {
        let m = RagEvaluator::new().evaluate(&RetrievedContext::empty(), &analysis, &source);
        prop_assert_eq!(m.context_precision, 0.0);

        let riskless = ProjectAnalysis::new("Project", "A web shop.", false, 0.0, vec![]);
        let m = RagEvaluator::new().evaluate(&RetrievedContext::empty(), &riskless, &source);
        prop_assert_eq!(m.faithfulness, 1.0);
        prop_assert_eq!(m.context_recall, 1.0);
    }
}
