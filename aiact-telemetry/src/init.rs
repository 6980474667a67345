//! Subscriber installation.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::capture::{JobTraceLayer, JobTraceStore};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `aiact_analysis=debug,info`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}

impl TelemetryConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// `RUST_LOG` wins over the configured level.
    fn env_filter(&self) -> Result<EnvFilter, ParseError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level),
        }
    }
}

/// Install the global subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed; the call is
/// then a no-op.
///
/// # Errors
///
/// Returns the parse error when the configured level is not a valid filter
/// directive.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<bool, ParseError> {
    install(config, None)
}

/// Like [`init_telemetry`], additionally capturing job spans into `store`.
pub fn init_with_trace_store(
    config: &TelemetryConfig,
    store: Arc<JobTraceStore>,
) -> Result<bool, ParseError> {
    install(config, Some(JobTraceLayer::new(store)))
}

fn install(config: &TelemetryConfig, capture: Option<JobTraceLayer>) -> Result<bool, ParseError> {
    let filter = config.env_filter()?;
    let fmt_layer = match config.format {
        LogFormat::Pretty => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
    };

    let installed = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(capture)
        .with(filter)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(level = %config.level, format = ?config.format, "telemetry initialised");
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn second_init_is_a_no_op() {
        let config = TelemetryConfig::default().with_level("warn");
        init_telemetry(&config).unwrap();
        assert!(!init_telemetry(&config).unwrap());
    }

    #[test]
    fn invalid_level_is_rejected() {
        let config = TelemetryConfig::default().with_level("aiact=verbose");
        // RUST_LOG, when set in the environment, takes precedence
        if std::env::var("RUST_LOG").is_err() {
            assert!(init_telemetry(&config).is_err());
        }
    }
}
