//! # Payroll Telemetry
//!
//! Logging and metrics for the payroll indexer.
//!
//! ## Components
//!
//! - **Logs**: `tracing` with a pretty or JSON `tracing-subscriber` layer
//! - **Metrics**: Prometheus counters, gauges and histograms in a global
//!   registry, encoded on demand
//!
//! ## Usage
//!
//! ```rust,ignore
//! use payroll_telemetry::{TelemetryConfig, init_telemetry};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `payroll-indexer` | Service name in logs |
//! | `PAYROLL_LOG_LEVEL` | `info` | Log level filter |
//! | `PAYROLL_JSON_LOGS` | `false` | JSON log lines |
//! | `PAYROLL_NETWORK` | `base-sepolia` | Network label |

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, BALANCE_FLOORS, DEGRADED_ACCRUALS,
    DISPATCH_DURATION, EVENTS_FAILED, EVENTS_PROCESSED, LAST_EVENT_TIMESTAMP,
};
pub use tracing_setup::{init_tracing, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Initialize metrics first
    let metrics_handle = register_metrics()?;

    let tracing_guard = init_tracing(&config)?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for creating a span with component context.
///
/// ```rust,ignore
/// use payroll_telemetry::component_span;
///
/// let _span = component_span!("dispatch", component = "dispatcher", block = 12345).entered();
/// ```
#[macro_export]
macro_rules! component_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::Config("bad level".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: bad level");
    }

    #[test]
    fn test_component_span_macro() {
        let span = component_span!("unit", component = "test", value = 1u8);
        let _entered = span.entered();
    }
}
