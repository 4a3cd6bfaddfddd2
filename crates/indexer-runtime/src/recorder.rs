//! Prometheus-backed ledger metrics.

use std::time::Duration;

use payroll_ledger::{EventKind, MetricsRecorder};
use payroll_telemetry::{BALANCE_FLOORS, DEGRADED_ACCRUALS, EVENTS_FAILED, EVENTS_PROCESSED};

/// Forwards dispatcher metrics to the global Prometheus registry.
///
/// Dispatch latency is observed by the pipeline around the whole call, so
/// the per-event duration handed to `record_event` is not re-recorded here.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusRecorder;

impl MetricsRecorder for PrometheusRecorder {
    fn record_event(&self, kind: EventKind, _duration: Duration) {
        EVENTS_PROCESSED.with_label_values(&[kind.as_str()]).inc();
    }

    fn record_failure(&self, kind: EventKind) {
        EVENTS_FAILED.with_label_values(&[kind.as_str()]).inc();
    }

    fn record_degraded_accrual(&self) {
        DEGRADED_ACCRUALS.inc();
    }

    fn record_floor(&self, field: &'static str) {
        BALANCE_FLOORS.with_label_values(&[field]).inc();
    }
}
