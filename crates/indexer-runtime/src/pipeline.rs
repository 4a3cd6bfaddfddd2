//! # Event Pipeline
//!
//! Moves events from an [`EventSource`] to the [`EventDispatcher`].
//!
//! ```text
//! [EventSource] ──reader task──→ mpsc(capacity) ──→ [dispatch loop] ──→ [EventDispatcher]
//!                                                        ↑
//!                                               shutdown watch
//! ```
//!
//! Events are applied strictly one at a time, in feed order. The loop ends
//! when the feed is exhausted, when shutdown is signalled, or on the first
//! fatal error (source or dispatch). Events already applied stay applied.

use std::sync::Arc;

use payroll_ledger::{EventDispatcher, EventEnvelope, EventKind, LedgerError};
use payroll_telemetry::{log_event, log_tx_event, time_histogram, DISPATCH_DURATION, LAST_EVENT_TIMESTAMP};
use shared_types::{Timestamp, TxHash};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;
use uuid::Uuid;

use crate::source::{EventSource, SourceError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("{kind} in transaction {tx_hash} failed: {source}")]
    Dispatch {
        tx_hash: TxHash,
        kind: EventKind,
        #[source]
        source: LedgerError,
    },

    #[error("event reader task failed: {0}")]
    Join(String),
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub events_read: u64,
    pub events_applied: u64,
    pub last_timestamp: Option<Timestamp>,
}

pub struct Pipeline {
    dispatcher: Arc<EventDispatcher>,
    channel_capacity: usize,
}

impl Pipeline {
    pub fn new(dispatcher: Arc<EventDispatcher>, channel_capacity: usize) -> Self {
        Self {
            dispatcher,
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Drive `source` to completion or until `shutdown` flips to `true`.
    pub async fn run(
        &self,
        source: Box<dyn EventSource>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<PipelineReport, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = payroll_telemetry::component_span!(
            "pipeline",
            component = "pipeline",
            run_id = %run_id
        );
        self.run_inner(run_id, source, shutdown).instrument(span).await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        source: Box<dyn EventSource>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<PipelineReport, PipelineError> {
        let (tx, mut rx) = mpsc::channel(self.channel_capacity);
        let reader = tokio::spawn(read_feed(source, tx));

        let mut report = PipelineReport {
            run_id,
            events_read: 0,
            events_applied: 0,
            last_timestamp: self.dispatcher.last_timestamp(),
        };

        log_event!(info, "pipeline", "Pipeline started");

        let mut shutdown_open = true;
        let outcome = loop {
            let stop = *shutdown.borrow();
            if stop {
                log_event!(info, "pipeline", "Shutdown signal received");
                break Ok(());
            }

            tokio::select! {
                biased;
                changed = shutdown.changed(), if shutdown_open => {
                    // A dropped sender means nobody can ask us to stop.
                    if changed.is_err() {
                        shutdown_open = false;
                    }
                }
                next = rx.recv() => {
                    let Some(next) = next else {
                        break Ok(());
                    };
                    let envelope = match next {
                        Ok(envelope) => envelope,
                        Err(e) => break Err(PipelineError::from(e)),
                    };
                    report.events_read += 1;
                    if let Err(e) = self.apply(&envelope) {
                        break Err(e);
                    }
                    report.events_applied += 1;
                    report.last_timestamp = self.dispatcher.last_timestamp();
                }
            }
        };

        // The reader may be parked on stdin.
        reader.abort();
        if let Err(e) = reader.await {
            if !e.is_cancelled() {
                return Err(PipelineError::Join(e.to_string()));
            }
        }

        outcome?;
        log_event!(
            info,
            "pipeline",
            "Pipeline finished",
            events_read = report.events_read,
            events_applied = report.events_applied
        );
        Ok(report)
    }

    fn apply(&self, envelope: &EventEnvelope) -> Result<(), PipelineError> {
        let _timer = time_histogram!(DISPATCH_DURATION);
        match self.dispatcher.dispatch(envelope) {
            Ok(_) => {
                LAST_EVENT_TIMESTAMP.set(envelope.block_timestamp as f64);
                Ok(())
            }
            Err(source) => {
                log_tx_event!(
                    error,
                    "pipeline",
                    "Event failed, stopping pipeline",
                    envelope.transaction_hash,
                    envelope.ledger_organization(),
                    event_kind = %envelope.kind(),
                    block = envelope.block_number,
                    error = %source
                );
                Err(PipelineError::Dispatch {
                    tx_hash: envelope.transaction_hash,
                    kind: envelope.kind(),
                    source,
                })
            }
        }
    }
}

/// Reader task: forwards envelopes until the feed ends, fails, or the
/// dispatch loop hangs up.
async fn read_feed(
    mut source: Box<dyn EventSource>,
    tx: mpsc::Sender<Result<EventEnvelope, SourceError>>,
) {
    loop {
        let next = match source.next_event().await {
            Ok(Some(envelope)) => Ok(envelope),
            Ok(None) => return,
            Err(e) => Err(e),
        };
        let failed = next.is_err();
        if tx.send(next).await.is_err() || failed {
            return;
        }
    }
}
