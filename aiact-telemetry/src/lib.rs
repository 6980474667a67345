//! # aiact-telemetry
//!
//! Logging for the analysis tools.
//!
//! - [`init_telemetry`] installs a `tracing` subscriber with an `EnvFilter`
//!   and a pretty or JSON formatter
//! - [`JobTraceLayer`] captures closed spans per `job_id` into a
//!   [`JobTraceStore`] so one job's timeline can be inspected afterwards

pub mod capture;
pub mod init;

pub use capture::{JobTraceLayer, JobTraceStore, SpanRecord};
pub use init::{LogFormat, TelemetryConfig, init_telemetry, init_with_trace_store};
