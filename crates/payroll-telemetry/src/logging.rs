//! Structured logging helpers.
//!
//! Every ledger log line carries the same core fields so that log queries
//! can be scoped to one organization, employee or transaction:
//! - `component`: emitting component (dispatcher, pipeline, source)
//! - `organization`: organization contract address
//! - `employee`: employee address
//! - `tx_hash`: transaction that emitted the event

/// Log with a component field.
#[macro_export]
macro_rules! log_event {
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log an event-related line with the transaction hash and organization.
#[macro_export]
macro_rules! log_tx_event {
    ($level:ident, $component:expr, $msg:expr, $tx_hash:expr, $organization:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            tx_hash = %$tx_hash,
            organization = %$organization,
            $($($field)*,)?
            $msg
        )
    };
}
