//! Error types for the chain access layer.

use thiserror::Error;

/// Chain access error type
#[derive(Error, Debug)]
pub enum ChainError {
    /// The node rejected a request; the message is passed through untranslated
    #[error("RPC error: {0}")]
    Rpc(String),

    /// HTTP transport failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A contract returned something other than what the binding expected
    #[error("unexpected return from {method}: expected {expected}")]
    UnexpectedReturn {
        method: String,
        expected: &'static str,
    },

    /// Named contract has no known deployed address
    #[error("{0} has not been deployed")]
    NotDeployed(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for chain operations
pub type ChainResult<T> = std::result::Result<T, ChainError>;
