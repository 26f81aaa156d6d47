use thiserror::Error;

/// Errors produced while parsing or constructing foundation types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}
