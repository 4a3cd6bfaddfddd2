//! # Error Types
//!
//! Parse failures for the textual forms of the shared primitives.

use thiserror::Error;

/// Errors raised while parsing an address, hash or amount from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input is not valid hexadecimal.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded byte length does not match the target type.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Input is not a valid unsigned decimal amount.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}
