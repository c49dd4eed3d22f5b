use std::time::Duration;

use thiserror::Error;
use tokenbridge_common::Transient;
use tokenbridge_primitives::{Amount, FieldElement};

/// Errors raised by chain gateways and the message prover.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No signer or account is available for the side being used.
    #[error("account context is not connected")]
    ConnectionMissing,

    #[error("insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: Amount, required: Amount },

    /// The chain refused the transaction for a reason not covered below.
    #[error("transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("timed out after {0:?} waiting for inclusion")]
    TimeoutExceeded(Duration),

    /// The outbox reports the withdrawal message as already consumed.
    #[error("withdrawal message already claimed on L1")]
    MessageAlreadyClaimed,

    /// The rollup already consumed the deposit message.
    #[error("deposit claim already consumed")]
    ClaimAlreadyConsumed,

    #[error("burn authorization missing or mismatched")]
    AuthorizationMissing,

    /// The deposit message has not reached the rollup yet.
    #[error("L1-to-L2 message not yet available on the rollup")]
    MessageNotYetAvailable,

    #[error("membership proof rejected: {0}")]
    ProofInvalid(String),

    #[error("block {0} is not proven yet")]
    BlockNotFinalized(u64),

    #[error("message {message} not found in block {block_number}")]
    MessageNotFound {
        block_number: u64,
        message: FieldElement,
    },

    #[error("rpc unavailable: {0}")]
    RpcUnavailable(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn rpc(msg: impl Into<String>) -> Self {
        Self::RpcUnavailable(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

impl Transient for GatewayError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::RpcUnavailable(_)
                | GatewayError::BlockNotFinalized(_)
                | GatewayError::MessageNotYetAvailable
        )
    }
}
