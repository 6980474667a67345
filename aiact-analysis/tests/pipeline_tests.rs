//! Extraction stages run one at a time.

mod common;

use std::sync::Arc;

use aiact_analysis::{AnalysisConfig, AnalysisError, RetrievalStatus, RiskExtractionPipeline};
use aiact_core::{ModelError, RetryPolicy, RiskLevel};
use aiact_model::MockLlm;
use aiact_rag::{InMemoryVectorStore, Retriever};

use common::*;

fn config() -> AnalysisConfig {
    AnalysisConfig::builder().retry(fast_retry()).build().unwrap()
}

#[tokio::test]
async fn retrieval_is_grounded_on_indexed_corpus() {
    let llm = Arc::new(MockLlm::new("analyst"));
    let pipeline = RiskExtractionPipeline::new(retriever(indexed_store().await), llm, config());

    let query = pipeline.formulate_query(BIOMETRIC_DOC);
    assert!(query.starts_with("Project Gatekeeper."));
    let grounding = pipeline.retrieve(&query).await.unwrap();

    assert_eq!(grounding.status, RetrievalStatus::Grounded);
    assert!(!grounding.context.is_empty());
    assert!(grounding.context.len() <= 4);

    let prompt = pipeline.build_prompt(&grounding, BIOMETRIC_DOC);
    assert!(prompt.contains("[Context 1"));
    assert!(prompt.contains("Project Gatekeeper"));
}

#[tokio::test]
async fn empty_collection_gives_empty_grounding() {
    let llm = Arc::new(MockLlm::new("analyst"));
    let pipeline =
        RiskExtractionPipeline::new(retriever(Arc::new(InMemoryVectorStore::new())), llm, config());

    let grounding = pipeline.retrieve("anything").await.unwrap();
    assert_eq!(grounding.status, RetrievalStatus::Empty);
    assert!(grounding.context.is_empty());
}

#[tokio::test]
async fn persistent_embedding_outage_degrades() {
    let retriever =
        Retriever::new(Arc::new(UnavailableEmbedder), indexed_store().await, "eu_ai_act");
    let pipeline = RiskExtractionPipeline::new(retriever, Arc::new(MockLlm::new("analyst")), config());

    let grounding = pipeline.retrieve("biometric").await.unwrap();
    assert_eq!(grounding.status, RetrievalStatus::Degraded);
    assert!(grounding.context.is_empty());
}

#[tokio::test]
async fn generation_partitions_risks_by_level() {
    let llm = Arc::new(MockLlm::new("analyst").with_response(BIOMETRIC_ANSWER));
    let pipeline = RiskExtractionPipeline::new(retriever(indexed_store().await), llm.clone(), config());

    let output = pipeline.run("doc-1", BIOMETRIC_DOC).await.unwrap();

    assert!(output.analysis.contains_ai);
    assert_eq!(output.analysis.high_risk_count(), 2);
    assert!(output.analysis.high_risks.iter().all(|r| r.level == RiskLevel::High));
    assert_eq!(output.generation_attempts, 1);
    assert_eq!(llm.call_count(), 1);

    let request = &llm.requests()[0];
    assert_eq!(request.system, "You are an expert AI compliance analyst. Respond only with valid JSON.");
    assert_eq!(request.max_tokens, 2000);
    assert!(request.response_schema.is_some());
}

#[tokio::test]
async fn malformed_answer_is_reprompted_once() {
    let llm = Arc::new(
        MockLlm::new("analyst")
            .with_response(r#"{"project_name": "Gatekeeper"}"#)
            .with_response(BIOMETRIC_ANSWER),
    );
    let pipeline = RiskExtractionPipeline::new(retriever(indexed_store().await), llm.clone(), config());

    let extraction = pipeline.generate("prompt").await.unwrap();

    assert_eq!(extraction.attempts, 2);
    assert_eq!(extraction.analysis.project_name, "Gatekeeper");
    let second = &llm.requests()[1].prompt;
    assert!(second.starts_with("prompt"));
    assert!(second.contains("could not be parsed"));
}

#[tokio::test]
async fn malformed_twice_fails() {
    let llm = Arc::new(MockLlm::new("analyst").with_response("no idea").with_response("still no idea"));
    let pipeline = RiskExtractionPipeline::new(retriever(indexed_store().await), llm.clone(), config());

    let err = pipeline.generate("prompt").await.unwrap_err();

    assert!(matches!(err, AnalysisError::MalformedModelOutput(_)));
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn transient_errors_retry_without_duplicating_risks() {
    let llm = Arc::new(
        MockLlm::new("analyst")
            .with_error(ModelError::RateLimited { provider: "analyst".into(), message: "429".into() })
            .with_response(BIOMETRIC_ANSWER),
    );
    let pipeline = RiskExtractionPipeline::new(retriever(indexed_store().await), llm.clone(), config());

    let extraction = pipeline.generate("prompt").await.unwrap();

    assert_eq!(extraction.attempts, 2);
    assert_eq!(extraction.analysis.total_risks(), 2);
}

#[tokio::test]
async fn auth_errors_fail_immediately() {
    let llm = Arc::new(
        MockLlm::new("analyst")
            .with_error(ModelError::Auth { provider: "analyst".into(), message: "401".into() }),
    );
    let config = AnalysisConfig::builder().retry(RetryPolicy::default()).build().unwrap();
    let pipeline = RiskExtractionPipeline::new(retriever(indexed_store().await), llm.clone(), config);

    let err = pipeline.generate("prompt").await.unwrap_err();

    assert!(matches!(err, AnalysisError::Provider(ModelError::Auth { .. })));
    assert_eq!(llm.call_count(), 1);
}
