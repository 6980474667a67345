//! Command-line arguments.

use std::path::PathBuf;

use aiact_rag::DEFAULT_COLLECTION;
use aiact_telemetry::LogFormat;
use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "aiact", version, about = "EU AI Act compliance analysis over a RAG pipeline")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[arg(long, default_value = "pretty", global = true)]
    pub log_format: LogFormat,

    /// Vector store snapshot file.
    #[arg(long, env = "AIACT_STORE_PATH", default_value = "./data/vector_store.json", global = true)]
    pub store: PathBuf,

    #[arg(long, default_value = DEFAULT_COLLECTION, global = true)]
    pub collection: String,

    /// Use the local hashing embedder instead of Azure OpenAI embeddings.
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(flatten)]
    pub azure: AzureArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Azure OpenAI connection settings.
#[derive(Args, Debug, Clone)]
pub struct AzureArgs {
    #[arg(long, env = "AZURE_OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_DEPLOYMENT_NAME", default_value = "gpt-4", global = true)]
    pub deployment: String,

    #[arg(long, env = "AZURE_OPENAI_API_VERSION", default_value = "2024-02-15-preview", global = true)]
    pub api_version: String,

    #[arg(
        long,
        env = "AZURE_OPENAI_EMBEDDING_DEPLOYMENT",
        default_value = "text-embedding-ada-002",
        global = true
    )]
    pub embedding_deployment: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chunk, embed and index the legislative text.
    Index {
        /// Plain-text export of the EU AI Act.
        #[arg(long)]
        source: PathBuf,

        /// Replace an existing collection.
        #[arg(long)]
        force: bool,

        /// Pack whole sentences instead of fixed-size windows.
        #[arg(long)]
        sentences: bool,

        #[arg(long, default_value_t = 1000)]
        chunk_size: usize,

        #[arg(long, default_value_t = 200)]
        chunk_overlap: usize,
    },

    /// Print collection statistics as JSON.
    Stats,

    /// Analyse a technical document and print the finished job as JSON.
    Analyze {
        /// Plain-text export of the technical document.
        #[arg(long)]
        document: PathBuf,

        /// Identifier recorded on the job. Defaults to the file name.
        #[arg(long)]
        document_id: Option<String>,

        /// Run the LLM judge after extraction.
        #[arg(long, env = "LLM_JUDGE_ENABLED", default_value_t = true, action = ArgAction::Set)]
        judge: bool,

        #[arg(long, default_value_t = 5)]
        top_k: usize,

        /// Print the job's captured spans after it finishes.
        #[arg(long)]
        trace: bool,

        #[arg(long, default_value_t = 500)]
        poll_interval_ms: u64,
    },
}
