//! Azure OpenAI chat-completions provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use aiact_core::AzureOpenAIConfig;
//! use aiact_model::openai::AzureOpenAIClient;
//!
//! let client = AzureOpenAIClient::new(
//!     AzureOpenAIConfig::new(
//!         std::env::var("AZURE_OPENAI_ENDPOINT")?,
//!         std::env::var("AZURE_OPENAI_API_KEY")?,
//!         "gpt-4",
//!     )
//! )?;
//! ```

mod client;
mod types;

pub use client::AzureOpenAIClient;
