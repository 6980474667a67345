//! Shared fixtures: a small indexed corpus and scripted model answers.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use aiact_analysis::{AnalysisJob, AnalysisService, JobId};
use aiact_core::{GenerationRequest, ModelError, RetryPolicy};
use aiact_rag::{
    Document, EmbeddingProvider, HashingEmbeddingProvider, InMemoryVectorStore, IndexingPipeline,
    RagConfig, Retriever, VectorStore,
};
use async_trait::async_trait;

pub const ACT: &str = "Article 5 Prohibited artificial intelligence practices. The placing on \
the market of AI systems for real-time remote biometric identification in publicly accessible \
spaces for the purposes of law enforcement shall be prohibited. Facial recognition databases built \
by untargeted scraping are prohibited. Article 6 Classification rules for high-risk AI systems. \
AI systems intended for border control management, migration and asylum, including automated \
decision making on travellers, shall be considered high-risk. Article 52 Transparency obligations \
apply to chatbots and emotion recognition systems.";

pub const BIOMETRIC_DOC: &str = "Project Gatekeeper. The kiosk performs facial recognition and \
real-time biometric identification of travellers at the border. A border control automated decision \
module grants or refuses entry based on a neural network score.";

pub const SHOP_DOC: &str = "Project Basket. A plain e-commerce CRUD site: product catalogue, \
shopping cart, checkout with card payments, order history and an admin page to edit products. \
Built with PostgreSQL and a REST backend.";

pub const BIOMETRIC_ANSWER: &str = r#"```json
{
  "project_name": "Gatekeeper",
  "description": "Border kiosk that uses facial recognition and biometric identification of travellers.",
  "contains_ai": true,
  "ai_confidence": 0.97,
  "risks": [
    {"description": "Real-time biometric identification of travellers", "category": "Prohibited AI",
     "level": "high", "eu_act_reference": "Article 5", "confidence_score": 0.9},
    {"description": "Automated border control decision on entry", "category": "High-Risk AI",
     "level": "high", "eu_act_reference": "Article 6", "confidence_score": 0.85}
  ]
}
```"#;

pub const SHOP_ANSWER: &str = r#"{
  "project_name": "Basket",
  "description": "An e-commerce site with product catalogue, shopping cart and checkout.",
  "contains_ai": false,
  "ai_confidence": 0.05,
  "risks": []
}"#;

pub const VERDICT: &str = r#"{"accuracy_score": 0.9, "completeness_score": 0.8, "consistency_score": 0.85, "reasoning": "Risks match the cited articles."}"#;

/// Answers like a model would for the two fixture documents.
pub fn scripted_analyst(request: &GenerationRequest) -> aiact_core::Result<String> {
    if request.prompt.contains("facial recognition") && request.prompt.contains("Project Gatekeeper") {
        Ok(BIOMETRIC_ANSWER.to_string())
    } else {
        Ok(SHOP_ANSWER.to_string())
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::default().with_base_delay(Duration::from_millis(5))
}

pub async fn indexed_store() -> Arc<dyn VectorStore> {
    let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
    let pipeline = IndexingPipeline::builder()
        .config(RagConfig::builder().chunk_size(200).chunk_overlap(40).top_k(4).build().unwrap())
        .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
        .vector_store(store.clone())
        .build()
        .unwrap();
    pipeline.index(&Document::new("eu_ai_act", ACT), false).await.unwrap();
    store
}

pub fn retriever(store: Arc<dyn VectorStore>) -> Retriever {
    Retriever::new(Arc::new(HashingEmbeddingProvider::default()), store, "eu_ai_act").with_top_k(4)
}

pub async fn wait_terminal(service: &AnalysisService, id: JobId) -> AnalysisJob {
    for _ in 0..2000 {
        let job = service.get_job(id).await.unwrap();
        if job.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never reached a terminal state");
}

/// Embedder that always fails with a transient error.
pub struct UnavailableEmbedder;

#[async_trait]
impl EmbeddingProvider for UnavailableEmbedder {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn embed(&self, _text: &str) -> aiact_core::Result<Vec<f32>> {
        Err(ModelError::Transport { provider: "unavailable".into(), message: "503".into() })
    }

    fn dimensions(&self) -> usize {
        256
    }
}
