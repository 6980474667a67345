use std::sync::Arc;

use aiact_cli::{Cli, run};
use aiact_telemetry::{JobTraceStore, TelemetryConfig, init_with_trace_store};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let traces = Arc::new(JobTraceStore::new());
    let telemetry = TelemetryConfig::default().with_level(&cli.log_level).with_format(cli.log_format);
    init_with_trace_store(&telemetry, traces.clone())?;

    run(cli, traces).await
}
