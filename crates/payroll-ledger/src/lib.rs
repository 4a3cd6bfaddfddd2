//! # payroll-ledger
//!
//! Streaming salary ledgers derived from payroll contract events.
//!
//! ## Role in System
//!
//! - **Event Consumer**: applies an ordered feed of organization contract
//!   events, one at a time
//! - **Derived State**: maintains the Employee, Organization, Joined View and
//!   Auto-Earn ledgers
//! - **Streaming Balances**: salary accrues per second between events and is
//!   checkpointed whenever a rate-affecting field changes
//!
//! ## Event Flow
//!
//! ```text
//! [Event Source] ──EventEnvelope──→ [EventDispatcher]
//!                                       │
//!                     ┌─────────────────┼──────────────────┐
//!                     ↓                 ↓                  ↓
//!              [RawEventLog]      [handlers]         [MetricsRecorder]
//!                                       │
//!                                   LedgerTx ──commit──→ [LedgerStore]
//! ```
//!
//! ## Failure Handling
//!
//! - An accrual that cannot be computed degrades to zero and the event
//!   continues
//! - Any other error aborts the event and none of its writes are committed
//! - Balances are clamped at zero, never negative

pub mod adapters;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use events::*;
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::*;
pub use service::{
    DispatchOutcome, EventDispatcher, EventScope, LedgerQueryService, LedgerTx, OrganizationChange,
};
