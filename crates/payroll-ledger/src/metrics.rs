//! Metrics hooks for event dispatch.
//!
//! The dispatcher reports through [`MetricsRecorder`]. [`Metrics`] keeps
//! atomic counters in process; a host can plug in its own recorder to
//! forward to Prometheus or similar.
//!
//! ## Usage
//!
//! ```ignore
//! use payroll_ledger::metrics::Metrics;
//!
//! let metrics = std::sync::Arc::new(Metrics::new());
//! let dispatcher = EventDispatcher::new(store, log, config).with_metrics(metrics.clone());
//! // ...
//! println!("{:?}", metrics.snapshot());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::events::EventKind;

/// Trait for custom metrics recording implementations.
pub trait MetricsRecorder: Send + Sync {
    /// An event was applied and committed.
    fn record_event(&self, kind: EventKind, duration: Duration);

    /// An event was rejected by a fatal error.
    fn record_failure(&self, kind: EventKind);

    /// An accrual fell back to zero because it could not be computed.
    fn record_degraded_accrual(&self);

    /// A balance was clamped at zero instead of going negative.
    fn record_floor(&self, field: &'static str);
}

/// In-process counters.
#[derive(Default)]
pub struct Metrics {
    per_kind: [AtomicU64; EventKind::COUNT],
    /// Events committed
    pub events_processed: AtomicU64,
    /// Events rejected
    pub events_failed: AtomicU64,
    pub degraded_accruals: AtomicU64,
    pub balance_floors: AtomicU64,
    /// Cumulative dispatch time in nanoseconds
    pub dispatch_time_ns: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events committed for one kind.
    pub fn processed(&self, kind: EventKind) -> u64 {
        self.per_kind[kind.index()].load(Ordering::Relaxed)
    }

    /// Average dispatch time in nanoseconds.
    pub fn avg_dispatch_ns(&self) -> u64 {
        let total = self.dispatch_time_ns.load(Ordering::Relaxed);
        let count = self.events_processed.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_processed: self.events_processed.load(Ordering::Relaxed),
            events_failed: self.events_failed.load(Ordering::Relaxed),
            degraded_accruals: self.degraded_accruals.load(Ordering::Relaxed),
            balance_floors: self.balance_floors.load(Ordering::Relaxed),
            avg_dispatch_ns: self.avg_dispatch_ns(),
        }
    }

    pub fn reset(&self) {
        for counter in &self.per_kind {
            counter.store(0, Ordering::Relaxed);
        }
        self.events_processed.store(0, Ordering::Relaxed);
        self.events_failed.store(0, Ordering::Relaxed);
        self.degraded_accruals.store(0, Ordering::Relaxed);
        self.balance_floors.store(0, Ordering::Relaxed);
        self.dispatch_time_ns.store(0, Ordering::Relaxed);
    }
}

impl MetricsRecorder for Metrics {
    fn record_event(&self, kind: EventKind, duration: Duration) {
        self.per_kind[kind.index()].fetch_add(1, Ordering::Relaxed);
        self.events_processed.fetch_add(1, Ordering::Relaxed);
        self.dispatch_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn record_failure(&self, _kind: EventKind) {
        self.events_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_degraded_accrual(&self) {
        self.degraded_accruals.fetch_add(1, Ordering::Relaxed);
    }

    fn record_floor(&self, _field: &'static str) {
        self.balance_floors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_processed: u64,
    pub events_failed: u64,
    pub degraded_accruals: u64,
    pub balance_floors: u64,
    pub avg_dispatch_ns: u64,
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_event(&self, _: EventKind, _: Duration) {}
    fn record_failure(&self, _: EventKind) {}
    fn record_degraded_accrual(&self) {}
    fn record_floor(&self, _: &'static str) {}
}
