//! # Shared Types Crate
//!
//! Primitive value types used across the payroll indexer.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: addresses, transaction hashes and token
//!   amounts are defined once and reused by the ledger and the runtime.
//! - **Canonical Text Form**: addresses and hashes always render as
//!   lowercase `0x`-prefixed hex; amounts render as decimal strings so that
//!   values above `u64::MAX` survive a JSON round trip.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
