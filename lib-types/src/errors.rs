//! Error types for primitive parsing and conversion.

use thiserror::Error;

/// Errors raised when parsing primitive values from their text forms
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {got}")]
    BadLength { expected: usize, got: usize },

    #[error("invalid decimal amount: {0}")]
    BadDecimal(String),
}
