//! # aiact-analysis
//!
//! Turns a technical document into an EU AI Act risk report.
//!
//! - [`RiskExtractionPipeline`] - query formulation, retrieval, prompt
//!   construction and strict parsing of one generation call
//! - [`AnalysisService`] - background jobs with a watchdog, evaluation and
//!   judge scoring, cancellation
//! - [`JobStore`] - where job state lives; [`InMemoryJobStore`] by default
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use aiact_analysis::{AnalysisConfig, AnalysisService};
//!
//! let service = AnalysisService::builder()
//!     .config(AnalysisConfig::builder().judge_enabled(true).build()?)
//!     .retriever(pipeline.retriever())
//!     .generator(Arc::new(client))
//!     .build()?;
//!
//! let job_id = service.start_analysis("spec.pdf", &text).await?;
//! ```

pub mod config;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod schema;
pub mod service;
pub mod store;

pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::{AnalysisError, Result};
pub use job::{AnalysisJob, JobId, JobStatus};
pub use pipeline::{Extraction, Grounding, PipelineOutput, RiskExtractionPipeline};
pub use report::{AnalysisReport, RetrievalStatus};
pub use service::{AnalysisService, AnalysisServiceBuilder, CANCELLED_MESSAGE};
pub use store::{InMemoryJobStore, JobStore};
