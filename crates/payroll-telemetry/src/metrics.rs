//! Prometheus metrics for the payroll indexer.
//!
//! All metrics follow the naming convention: `payroll_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, IntCounter, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DISPATCH METRICS
    // =========================================================================

    /// Events applied to the ledgers, by event kind
    pub static ref EVENTS_PROCESSED: CounterVec = CounterVec::new(
        Opts::new("payroll_dispatch_events_processed_total", "Events applied to the ledgers"),
        &["kind"]
    ).expect("metric creation failed");

    /// Events whose handler failed fatally, by event kind
    pub static ref EVENTS_FAILED: CounterVec = CounterVec::new(
        Opts::new("payroll_dispatch_events_failed_total", "Events rejected by a fatal handler error"),
        &["kind"]
    ).expect("metric creation failed");

    /// Event handling duration
    pub static ref DISPATCH_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "payroll_dispatch_duration_seconds",
            "Time spent applying one event"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).expect("valid buckets"))
    ).expect("metric creation failed");

    /// Timestamp of the last applied event
    pub static ref LAST_EVENT_TIMESTAMP: Gauge = Gauge::new(
        "payroll_dispatch_last_event_timestamp_seconds",
        "Chain timestamp of the last applied event"
    ).expect("metric creation failed");

    // =========================================================================
    // LEDGER METRICS
    // =========================================================================

    /// Accrual computations that fell back to zero because of a lookup failure
    pub static ref DEGRADED_ACCRUALS: IntCounter = IntCounter::new(
        "payroll_ledger_degraded_accruals_total",
        "Streaming balance computations degraded to zero accrual"
    ).expect("metric creation failed");

    /// Balances clamped at zero instead of going negative
    pub static ref BALANCE_FLOORS: CounterVec = CounterVec::new(
        Opts::new("payroll_ledger_balance_floors_total", "Balances silently floored at zero"),
        &["field"]
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Dispatch
        Box::new(EVENTS_PROCESSED.clone()),
        Box::new(EVENTS_FAILED.clone()),
        Box::new(DISPATCH_DURATION.clone()),
        Box::new(LAST_EVENT_TIMESTAMP.clone()),
        // Ledger
        Box::new(DEGRADED_ACCRUALS.clone()),
        Box::new(BALANCE_FLOORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
