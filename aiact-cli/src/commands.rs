//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use aiact_analysis::{AnalysisConfig, AnalysisService, JobStatus};
use aiact_core::AzureOpenAIConfig;
use aiact_model::AzureOpenAIClient;
use aiact_rag::openai::AzureOpenAIEmbeddingProvider;
use aiact_rag::{
    Chunker, Document, EmbeddingProvider, FixedSizeChunker, HashingEmbeddingProvider,
    InMemoryVectorStore, IndexingPipeline, RagConfig, Retriever, SentenceChunker, VectorStore,
};
use aiact_telemetry::JobTraceStore;
use anyhow::{Context, Result, anyhow, bail};
use serde_json::json;
use tracing::info;

use crate::cli::{AzureArgs, Cli, Command};

/// Execute the parsed command line.
pub async fn run(cli: Cli, traces: Arc<JobTraceStore>) -> Result<()> {
    let Cli { store, collection, offline, azure, command, .. } = cli;

    let vector_store: Arc<dyn VectorStore> = Arc::new(
        InMemoryVectorStore::open(&store)
            .await
            .with_context(|| format!("failed to open vector store at {}", store.display()))?,
    );

    match command {
        Command::Index { source, force, sentences, chunk_size, chunk_overlap } => {
            let config = RagConfig::builder()
                .chunk_size(chunk_size)
                .chunk_overlap(chunk_overlap)
                .collection(collection)
                .build()?;
            let chunker: Arc<dyn Chunker> = if sentences {
                Arc::new(SentenceChunker::from_config(&config)?)
            } else {
                Arc::new(FixedSizeChunker::from_config(&config)?)
            };
            let pipeline = IndexingPipeline::builder()
                .config(config)
                .embedding_provider(embedder(&azure, offline)?)
                .vector_store(vector_store)
                .chunker(chunker)
                .build()?;

            let text = read_text(&source).await?;
            let document = Document::new(file_name(&source), text)
                .with_source_uri(source.display().to_string());
            let outcome = pipeline.index(&document, force).await?;

            print_json(&json!({
                "collection": pipeline.collection(),
                "indexed_count": outcome.indexed_count,
                "skipped": outcome.skipped,
                "version": outcome.version,
            }))
        }

        Command::Stats => {
            let stats = vector_store.stats(&collection).await?;
            print_json(&stats)
        }

        Command::Analyze { document, document_id, judge, top_k, trace, poll_interval_ms } => {
            let retriever = Retriever::new(embedder(&azure, offline)?, vector_store, collection)
                .with_top_k(top_k);
            let generator = Arc::new(AzureOpenAIClient::new(azure_config(&azure)?)?);
            let service = AnalysisService::builder()
                .config(AnalysisConfig::builder().judge_enabled(judge).build()?)
                .retriever(retriever)
                .generator(generator)
                .build()?;

            let text = read_text(&document).await?;
            let document_id = document_id.unwrap_or_else(|| file_name(&document));
            let job_id = service.start_analysis(&document_id, &text).await?;
            info!(%job_id, "waiting for analysis");

            let poll = Duration::from_millis(poll_interval_ms.max(10));
            let job = loop {
                let job = service.get_job(job_id).await?;
                if job.is_terminal() {
                    break job;
                }
                tokio::time::sleep(poll).await;
            };

            print_json(&job)?;
            if trace {
                let spans = traces.spans_for(&job_id.to_string());
                eprintln!("{}", serde_json::to_string_pretty(&spans)?);
            }

            match job.status {
                JobStatus::Failed { message } => bail!("analysis {job_id} failed: {message}"),
                _ => Ok(()),
            }
        }
    }
}

fn azure_config(args: &AzureArgs) -> Result<AzureOpenAIConfig> {
    let endpoint = args.endpoint.clone().ok_or_else(|| anyhow!("AZURE_OPENAI_ENDPOINT is not set"))?;
    let api_key = args.api_key.clone().ok_or_else(|| anyhow!("AZURE_OPENAI_API_KEY is not set"))?;
    Ok(AzureOpenAIConfig::new(endpoint, api_key, &args.deployment)
        .with_api_version(&args.api_version)
        .with_embedding_deployment(&args.embedding_deployment))
}

fn embedder(args: &AzureArgs, offline: bool) -> Result<Arc<dyn EmbeddingProvider>> {
    if offline {
        return Ok(Arc::new(HashingEmbeddingProvider::default()));
    }
    let provider = AzureOpenAIEmbeddingProvider::new(azure_config(args)?)
        .context("failed to create the Azure OpenAI embedding client")?;
    Ok(Arc::new(provider))
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.with_context(|| format!("failed to read {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_else(|| "document".to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
