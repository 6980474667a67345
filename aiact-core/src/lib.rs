//! # aiact-core
//!
//! Shared data contracts for the EU AI Act compliance analyzer.
//!
//! ## Overview
//!
//! Every other crate in the workspace speaks in the types defined here:
//!
//! - [`Risk`] / [`ProjectAnalysis`] - the structured result of one document analysis
//! - [`EvaluationMetrics`] - heuristic RAG scores derived from an analysis
//! - [`JudgeResult`] - the advisory verdict of a second, independent model call
//! - [`GenerationProvider`] - the capability used to call a generation model
//! - [`ModelError`] - the error kinds a provider call can fail with
//! - [`RetryPolicy`] - bounded, exponential retries for transient provider errors
//!
//! Structured model output is parsed strictly via [`structured::parse_structured`]
//! and checked against a JSON schema with [`structured::parse_validated`].

pub mod analysis;
pub mod error;
pub mod evaluation;
pub mod provider;
pub mod retry;
pub mod structured;
pub mod text;

pub use analysis::{ProjectAnalysis, Risk, RiskLevel};
pub use error::{ModelError, Result};
pub use evaluation::{EvaluationMetrics, JudgeResult};
pub use provider::{AzureOpenAIConfig, GenerationProvider, GenerationRequest};
pub use retry::RetryPolicy;
pub use structured::{parse_structured, parse_validated};
pub use text::truncate_chars;
