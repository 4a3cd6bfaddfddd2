//! # Domain Layer
//!
//! Ledger rows, the streaming calculator and the error taxonomy. No I/O.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod streaming;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use streaming::*;
pub use value_objects::*;
