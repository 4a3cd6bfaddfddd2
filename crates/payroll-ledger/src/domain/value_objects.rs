//! # Value Objects
//!
//! Immutable inputs threaded through the handlers: the identity of the
//! triggering event, the partial update applied to an employee, and the
//! ledger configuration.

use serde::{Deserialize, Serialize};
use shared_types::{Amount, Timestamp, TxHash};

use super::streaming::DEFAULT_PERIOD_SECS;

/// Identity of the event currently being applied. Every write stamps
/// `lastUpdated` and `lastTransaction` from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventContext {
    pub block_number: u64,
    pub timestamp: Timestamp,
    pub tx_hash: TxHash,
}

impl EventContext {
    pub fn new(block_number: u64, timestamp: Timestamp, tx_hash: TxHash) -> Self {
        Self {
            block_number,
            timestamp,
            tx_hash,
        }
    }
}

/// Partial update for an Employee Ledger entry. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeChange {
    pub name: Option<String>,
    pub salary: Option<Amount>,
    pub status: Option<bool>,
    /// Stream start announced by the contract. Zero or absent means "now".
    pub stream_start: Option<Timestamp>,
    /// Pay out the accrued balance before a salary change takes effect.
    pub settle_on_salary_change: bool,
}

impl EmployeeChange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_salary(mut self, salary: Amount) -> Self {
        self.salary = Some(salary);
        self
    }

    pub fn with_status(mut self, status: bool) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_stream_start(mut self, start: Timestamp) -> Self {
        self.stream_start = Some(start);
        self
    }

    pub fn settling(mut self) -> Self {
        self.settle_on_salary_change = true;
        self
    }

    /// Stream start to use for an event at `now`.
    pub fn resolved_stream_start(&self, now: Timestamp) -> Timestamp {
        match self.stream_start {
            Some(start) if start != 0 => start,
            _ => now,
        }
    }
}

/// Ledger-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Period used when an organization has none (or zero) stored.
    pub default_period_secs: u64,
    /// Reject events whose timestamp is older than the previous event.
    pub strict_ordering: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_period_secs: DEFAULT_PERIOD_SECS,
            strict_ordering: false,
        }
    }
}
