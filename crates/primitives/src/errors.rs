use thiserror::Error;

/// Errors produced while parsing primitive values from user or RPC input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("value is not a canonical field element")]
    NotInField,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}
