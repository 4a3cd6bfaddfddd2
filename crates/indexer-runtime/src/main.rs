//! # Payroll Indexer
//!
//! Applies an ordered feed of payroll contract events to the derived
//! ledgers. See the library crate for the module layout.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use indexer_runtime::{source, IndexerRuntime, RuntimeConfig};
use payroll_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging and metrics
    let telemetry = TelemetryConfig::from_env();
    let metrics_port = telemetry.metrics_port;
    let _telemetry = init_telemetry(telemetry).context("Failed to initialize telemetry")?;

    // Load configuration
    let config = RuntimeConfig::from_env().context("Invalid runtime configuration")?;
    let runtime = Arc::new(IndexerRuntime::new(config));

    let metrics_server = runtime.start_metrics_server(metrics_port);

    let feed = source::open(&runtime.config().events_path)
        .await
        .context("Failed to open event feed")?;

    let signal_runtime = Arc::clone(&runtime);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received");
            signal_runtime.shutdown();
        }
    });

    info!("Indexer is running. Press Ctrl+C to stop.");
    let result = runtime.run(feed).await;

    // Stop the metrics endpoint whether or not the feed failed
    runtime.shutdown();
    if let Some(handle) = metrics_server {
        let _ = handle.await;
    }

    let report = result.context("Indexer stopped on a fatal error")?;
    info!(
        run_id = %report.run_id,
        events_read = report.events_read,
        events_applied = report.events_applied,
        last_timestamp = ?report.last_timestamp,
        "Event feed applied"
    );

    Ok(())
}
