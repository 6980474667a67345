//! # aiact-eval
//!
//! Two independent quality signals for a finished risk analysis:
//!
//! - [`RagEvaluator`] - deterministic keyword-overlap metrics (faithfulness,
//!   answer relevance, context precision, context recall)
//! - [`LlmJudge`] - a second model call that grades accuracy, completeness
//!   and consistency, with free-text reasoning
//!
//! Neither one modifies the analysis it scores.

pub mod error;
pub mod judge;
pub mod metrics;
pub mod terms;

pub use error::{EvalError, Result};
pub use judge::{JudgeConfig, LlmJudge};
pub use metrics::RagEvaluator;
