//! # Ports
//!
//! - **Inbound** (`inbound`): read API over the derived ledgers
//! - **Outbound** (`outbound`): ledger storage and the raw event log

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
