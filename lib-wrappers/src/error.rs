//! Error types for the wrapper layer.

use lib_chain::ChainError;
use thiserror::Error;

/// Wrapper operation error type
#[derive(Error, Debug)]
pub enum WrapperError {
    /// A required option is missing or zero
    #[error("{0} is not defined")]
    MissingArgument(&'static str),

    #[error("DAO must have at least one founder")]
    NoFounders,

    #[error("numOfChoices must be between {min} and {max}, got {given}")]
    ChoicesOutOfRange { given: u32, min: u32, max: u32 },

    #[error("vote choice is not valid: {vote} (numOfChoices: {num_choices})")]
    InvalidVote { vote: u32, num_choices: u32 },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unsupported(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Result type alias for wrapper operations
pub type WrapperResult<T> = std::result::Result<T, WrapperError>;
