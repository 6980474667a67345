//! Indexing pipeline and retriever behaviour.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use aiact_core::ModelError;
use aiact_rag::{
    Document, EmbeddingProvider, HashingEmbeddingProvider, InMemoryVectorStore, IndexingPipeline,
    RagConfig, RagError, Retriever, SentenceChunker, VectorStore,
};
use async_trait::async_trait;

const ACT: &str = "Article 5 Prohibited artificial intelligence practices. The following AI \
practices shall be prohibited: the use of real-time remote biometric identification systems in \
publicly accessible spaces for the purposes of law enforcement.\x0c Article 6 Classification rules \
for high-risk AI systems. AI systems intended to be used for border control management and \
migration shall be considered high-risk. Article 52 Transparency obligations for certain AI \
systems such as chatbots.";

/// Counts embedding calls, delegating to the hashing embedder.
struct CountingEmbedder {
    inner: HashingEmbeddingProvider,
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    fn name(&self) -> &str {
        "counting"
    }

    async fn embed(&self, text: &str) -> aiact_core::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn embed(&self, _text: &str) -> aiact_core::Result<Vec<f32>> {
        Err(ModelError::Transport { provider: "failing".into(), message: "503".into() })
    }

    fn dimensions(&self) -> usize {
        8
    }
}

fn config() -> RagConfig {
    RagConfig::builder().chunk_size(160).chunk_overlap(40).top_k(3).build().unwrap()
}

#[tokio::test]
async fn indexes_once_and_skips_without_force() {
    let embedder = Arc::new(CountingEmbedder {
        inner: HashingEmbeddingProvider::default(),
        calls: AtomicUsize::new(0),
    });
    let pipeline = IndexingPipeline::builder()
        .config(config())
        .embedding_provider(embedder.clone())
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .unwrap();

    let first = pipeline.index(&Document::new("eu_ai_act", ACT), false).await.unwrap();
    assert!(!first.skipped);
    assert!(first.indexed_count > 1);
    let calls_after_first = embedder.calls.load(Ordering::SeqCst);
    assert_eq!(calls_after_first, first.indexed_count);

    let second = pipeline.index(&Document::new("eu_ai_act", ACT), false).await.unwrap();
    assert!(second.skipped);
    assert_eq!(second.indexed_count, first.indexed_count);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_after_first);

    let forced_doc = Document::new("eu_ai_act", "Article 10 Data governance.");
    let forced = pipeline.index(&forced_doc, true);
    let forced = forced.await.unwrap();
    assert_eq!(forced.indexed_count, 1);
    assert_eq!(pipeline.stats().await.unwrap().version, 2);
}

#[tokio::test]
async fn chunks_carry_article_and_page_metadata() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = IndexingPipeline::builder()
        .config(config())
        .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
        .vector_store(store.clone())
        .chunker(Arc::new(SentenceChunker::new(160, 40).unwrap()))
        .build()
        .unwrap();
    pipeline.index(&Document::new("eu_ai_act", ACT), false).await.unwrap();

    let query = HashingEmbeddingProvider::default().embed("border control").await.unwrap();
    let context = store.query("eu_ai_act", &query, 100).await.unwrap();
    assert!(context.chunks().any(|c| c.metadata.article_ref.as_deref() == Some("Article 6")));
    assert!(context.chunks().any(|c| c.metadata.page == Some(2)));
    assert!(context.chunks().all(|c| c.document_id == "eu_ai_act"));
}

#[tokio::test]
async fn retriever_finds_relevant_article() {
    let pipeline = IndexingPipeline::builder()
        .config(config())
        .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .unwrap();
    pipeline.index(&Document::new("eu_ai_act", ACT), false).await.unwrap();

    let retriever = pipeline.retriever();
    assert_eq!(retriever.top_k(), 3);
    let context = retriever.retrieve("real-time remote biometric identification systems").await;
    let context = context.unwrap();
    assert!(!context.is_empty());
    assert!(context.len() <= 3);
    assert!(context.entries[0].chunk.text.contains("biometric"));

    let one = retriever.retrieve_top("border control management", 1).await.unwrap();
    assert_eq!(one.len(), 1);
}

#[tokio::test]
async fn empty_collection_is_not_an_error() {
    let retriever = Retriever::new(
        Arc::new(HashingEmbeddingProvider::default()),
        Arc::new(InMemoryVectorStore::new()),
        "eu_ai_act",
    );
    let context = retriever.retrieve("anything").await.unwrap();
    assert!(context.is_empty());
}

#[tokio::test]
async fn embedding_failure_is_distinct() {
    let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
    let retriever = Retriever::new(Arc::new(FailingEmbedder), store, "eu_ai_act");
    let err = retriever.retrieve("anything").await.unwrap_err();
    assert!(matches!(err, RagError::Embedding(ModelError::Transport { .. })));
    assert!(err.is_transient());
}

#[tokio::test]
async fn builder_requires_provider_and_store() {
    let missing = IndexingPipeline::builder().config(config()).build();
    assert!(matches!(missing, Err(RagError::Config(_))));
}
