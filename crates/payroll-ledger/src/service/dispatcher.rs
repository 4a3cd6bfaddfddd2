//! # Event Dispatcher
//!
//! Applies events strictly one at a time:
//!
//! 1. ordering guard on `blockTimestamp`
//! 2. append the raw record to the event log
//! 3. run the handler inside a fresh [`LedgerTx`]
//! 4. audit the touched rows against the ledger invariants
//! 5. commit
//!
//! A fatal error at any step drops the staged writes and is returned to the
//! caller. The raw record stays in the log: it records what was received,
//! not what was applied.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use shared_types::Timestamp;
use tracing::{debug, error, warn};

use super::{handlers, EventScope, LedgerTx};
use crate::domain::{check_employee, check_organization, LedgerConfig, LedgerError};
use crate::events::{EventEnvelope, EventKind, RawEventRecord};
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{LedgerStore, RawEventLog, WriteBatch};

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Id of the raw event record.
    pub record_id: String,
    pub kind: EventKind,
    /// Rows committed to the store.
    pub rows_written: usize,
}

pub struct EventDispatcher {
    store: Arc<dyn LedgerStore>,
    event_log: Arc<dyn RawEventLog>,
    metrics: Arc<dyn MetricsRecorder>,
    config: LedgerConfig,
    /// Timestamp of the last applied event. Held for the whole dispatch, so
    /// events are applied one at a time.
    last_timestamp: Mutex<Option<Timestamp>>,
}

impl EventDispatcher {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        event_log: Arc<dyn RawEventLog>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            store,
            event_log,
            metrics: Arc::new(NoOpMetrics),
            config,
            last_timestamp: Mutex::new(None),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Timestamp of the last event applied.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        *self.last_timestamp.lock()
    }

    /// Apply one event and commit its writes.
    pub fn dispatch(&self, envelope: &EventEnvelope) -> Result<DispatchOutcome, LedgerError> {
        let kind = envelope.kind();
        let started = Instant::now();
        match self.apply(envelope) {
            Ok(outcome) => {
                self.metrics.record_event(kind, started.elapsed());
                debug!(
                    kind = %kind,
                    organization = %envelope.ledger_organization(),
                    employee = ?envelope.event.employee(),
                    tx_hash = %envelope.transaction_hash,
                    rows = outcome.rows_written,
                    "Event applied"
                );
                Ok(outcome)
            }
            Err(err) => {
                self.metrics.record_failure(kind);
                error!(
                    kind = %kind,
                    organization = %envelope.ledger_organization(),
                    employee = ?envelope.event.employee(),
                    tx_hash = %envelope.transaction_hash,
                    block_number = envelope.block_number,
                    error = %err,
                    "Event rejected"
                );
                Err(err)
            }
        }
    }

    fn apply(&self, envelope: &EventEnvelope) -> Result<DispatchOutcome, LedgerError> {
        let mut last_timestamp = self.last_timestamp.lock();
        self.check_ordering(*last_timestamp, envelope)?;

        let record = RawEventRecord::from_envelope(envelope)?;
        let record_id = record.id.clone();
        self.event_log.append(record)?;

        let mut scope = EventScope::new(
            LedgerTx::begin(self.store.as_ref()),
            envelope.context(),
            &self.config,
            self.metrics.as_ref(),
        );
        handlers::handle(&mut scope, envelope)?;
        audit(scope.tx.staged(), envelope);
        let rows_written = scope.tx.commit()?;

        let latest = match *last_timestamp {
            Some(last) => last.max(envelope.block_timestamp),
            None => envelope.block_timestamp,
        };
        *last_timestamp = Some(latest);
        Ok(DispatchOutcome {
            record_id,
            kind: envelope.kind(),
            rows_written,
        })
    }

    fn check_ordering(
        &self,
        last_seen: Option<Timestamp>,
        envelope: &EventEnvelope,
    ) -> Result<(), LedgerError> {
        let Some(last_seen) = last_seen else {
            return Ok(());
        };
        if envelope.block_timestamp >= last_seen {
            return Ok(());
        }
        if self.config.strict_ordering {
            return Err(LedgerError::OutOfOrder {
                timestamp: envelope.block_timestamp,
                last_seen,
            });
        }
        warn!(
            timestamp = envelope.block_timestamp,
            last_seen,
            tx_hash = %envelope.transaction_hash,
            "Event timestamp went backwards; applying anyway"
        );
        Ok(())
    }
}

/// Log every staged row that breaks an invariant.
fn audit(batch: &WriteBatch, envelope: &EventEnvelope) {
    for org in batch.organizations.values() {
        if let Err(violation) = check_organization(org) {
            error!(
                organization = %org.organization,
                field = violation.field,
                expected = %violation.expected,
                actual = %violation.actual,
                tx_hash = %envelope.transaction_hash,
                "Organization invariant violated"
            );
        }
    }
    for employee in batch.employees.values() {
        if let Err(violation) = check_employee(employee) {
            error!(
                organization = %employee.organization,
                employee = %employee.employee,
                field = violation.field,
                expected = %violation.expected,
                actual = %violation.actual,
                tx_hash = %envelope.transaction_hash,
                "Employee invariant violated"
            );
        }
    }
}
