//! # Service Layer
//!
//! Event handlers and the ledger operations they are built from.
//!
//! ```text
//! EventDispatcher ──→ handlers ──→ employee (checkpoint, settle, change)
//!                                   │
//!                                   ├──→ organization (totals, counters, recalc)
//!                                   └──→ joined_view (refresh, fan-out)
//! ```
//!
//! Every operation runs against the [`EventScope`] of the event being
//! applied and stages its writes in the scope's [`LedgerTx`].

pub mod dispatcher;
pub mod employee;
pub mod handlers;
pub mod joined_view;
pub mod organization;
pub mod query;
pub mod unit_of_work;

pub use dispatcher::{DispatchOutcome, EventDispatcher};
pub use organization::OrganizationChange;
pub use query::LedgerQueryService;
pub use unit_of_work::LedgerTx;

use shared_types::{Amount, Timestamp};

use crate::domain::{EventContext, LedgerConfig, LedgerError};
use crate::metrics::MetricsRecorder;

/// Everything a handler needs while applying one event.
pub struct EventScope<'a> {
    pub tx: LedgerTx<'a>,
    pub ctx: EventContext,
    pub config: &'a LedgerConfig,
    pub metrics: &'a dyn MetricsRecorder,
}

impl<'a> EventScope<'a> {
    pub fn new(
        tx: LedgerTx<'a>,
        ctx: EventContext,
        config: &'a LedgerConfig,
        metrics: &'a dyn MetricsRecorder,
    ) -> Self {
        Self {
            tx,
            ctx,
            config,
            metrics,
        }
    }

    /// Timestamp of the event being applied.
    pub fn now(&self) -> Timestamp {
        self.ctx.timestamp
    }

    /// `value - amount`, clamped at zero. A clamp is logged and counted but
    /// never raised.
    pub fn floor_sub(&self, value: Amount, amount: Amount, field: &'static str) -> Amount {
        if amount > value {
            tracing::debug!(
                field,
                value = %value,
                amount = %amount,
                tx_hash = %self.ctx.tx_hash,
                floored = true,
                "Balance clamped at zero"
            );
            self.metrics.record_floor(field);
        }
        value.saturating_sub(amount)
    }
}

/// Checked `a + b` for a ledger field.
pub(crate) fn add(a: Amount, b: Amount, field: &'static str) -> Result<Amount, LedgerError> {
    a.checked_add(b)
        .ok_or(LedgerError::ArithmeticOverflow { field })
}
