//! # aiact-model
//!
//! Generation-model providers for the EU AI Act compliance analyzer.
//!
//! ## Overview
//!
//! Both providers implement [`aiact_core::GenerationProvider`]:
//!
//! - `AzureOpenAIClient` - Azure OpenAI chat completions (feature `azure`)
//! - [`MockLlm`] - scripted responses for tests and offline runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aiact_model::MockLlm;
//!
//! let llm = MockLlm::new("mock").with_response(r#"{"risks": []}"#);
//! ```
//!
//! ## Features
//!
//! - `azure` (default) - Azure OpenAI client over `reqwest`

pub mod mock;
#[cfg(feature = "azure")]
pub mod openai;

pub use mock::MockLlm;
#[cfg(feature = "azure")]
pub use openai::AzureOpenAIClient;
