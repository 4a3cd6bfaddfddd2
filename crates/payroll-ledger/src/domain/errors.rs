//! # Domain Errors
//!
//! Every failure inside the ledger is a [`LedgerError`]. What happens next is
//! decided by its [`FailureClass`], never by which handler raised it:
//!
//! - `Degrade`: logged, counted, and replaced by a zero-accrual result.
//! - `Fatal`: the handler aborts, the staged writes of the event are
//!   dropped, and the dispatcher returns the error.
//!
//! A missing ledger entry is not an error. Lookups return `Option` and the
//! handlers branch on it.

use shared_types::Timestamp;
use thiserror::Error;

/// How a failure is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Replaced by a fallback value; processing of the event continues.
    Degrade,
    /// Aborts the event; no staged write is committed.
    Fatal,
}

/// Errors raised by the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The backing store failed to read or commit.
    #[error("storage error: {0}")]
    Storage(String),

    /// A 256-bit counter would wrap.
    #[error("arithmetic overflow while updating {field}")]
    ArithmeticOverflow { field: &'static str },

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("lock poisoned")]
    LockPoisoned,

    /// A payload or record could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The raw event log rejected an append.
    #[error("event log error: {0}")]
    EventLog(String),

    /// An event arrived with a timestamp older than the previous one.
    #[error("out-of-order event: timestamp {timestamp} is before {last_seen}")]
    OutOfOrder {
        timestamp: Timestamp,
        last_seen: Timestamp,
    },

    /// The streaming balance could not be computed.
    #[error("accrual unavailable: {0}")]
    AccrualUnavailable(#[source] Box<LedgerError>),
}

impl LedgerError {
    /// Classify this error.
    pub fn class(&self) -> FailureClass {
        match self {
            Self::AccrualUnavailable(_) => FailureClass::Degrade,
            Self::Storage(_)
            | Self::ArithmeticOverflow { .. }
            | Self::LockPoisoned
            | Self::Serialization(_)
            | Self::EventLog(_)
            | Self::OutOfOrder { .. } => FailureClass::Fatal,
        }
    }

    /// Wrap a failure that happened while computing an accrual.
    pub fn accrual(source: LedgerError) -> Self {
        match source {
            already @ Self::AccrualUnavailable(_) => already,
            other => Self::AccrualUnavailable(Box::new(other)),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.class() == FailureClass::Fatal
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accrual_failures_degrade() {
        let err = LedgerError::accrual(LedgerError::Storage("disk gone".into()));
        assert_eq!(err.class(), FailureClass::Degrade);
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn test_accrual_wrapping_is_flat() {
        let once = LedgerError::accrual(LedgerError::LockPoisoned);
        let twice = LedgerError::accrual(once);
        match twice {
            LedgerError::AccrualUnavailable(inner) => {
                assert!(matches!(*inner, LedgerError::LockPoisoned))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_everything_else_is_fatal() {
        let errors = [
            LedgerError::Storage("x".into()),
            LedgerError::ArithmeticOverflow { field: "totalSalary" },
            LedgerError::LockPoisoned,
            LedgerError::Serialization("x".into()),
            LedgerError::EventLog("x".into()),
            LedgerError::OutOfOrder {
                timestamp: 1,
                last_seen: 2,
            },
        ];
        for err in errors {
            assert_eq!(err.class(), FailureClass::Fatal, "{err}");
        }
    }
}
