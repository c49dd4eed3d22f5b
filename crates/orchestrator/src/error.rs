use std::time::Duration;

use thiserror::Error;
use tokenbridge_common::{Cancelled, Transient};
use tokenbridge_gateway::GatewayError;
use tokenbridge_primitives::ChainSide;

/// Why a bridge operation ended without a result.
///
/// Each variant names the step that failed and, where a gateway call was
/// involved, wraps the gateway's error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The account on one side of the bridge is absent or disconnected.
    #[error("{0} account is not connected")]
    ConnectionMissing(ChainSide),

    /// No gateways have been bound to the orchestrator yet.
    #[error("bridge gateways are not bound")]
    GatewaysUnbound,

    /// Another deposit, withdrawal or mint holds the flow lock.
    #[error("another bridge flow is already running")]
    FlowAlreadyInProgress,

    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// The flow's cancellation token fired. Transactions already broadcast are
    /// not rolled back.
    #[error("flow cancelled")]
    Cancelled,

    /// The rollup could not produce a claim secret; nothing was escrowed.
    #[error("preparing the claim secret failed: {0}")]
    ClaimSecret(GatewayError),

    #[error("escrow on L1 failed: {0}")]
    Escrow(GatewayError),

    /// The deposit message never became claimable on the rollup.
    #[error("deposit message did not reach the rollup after {waited:?}")]
    PropagationTimeout { waited: Duration },

    /// The rollup refused to answer whether the deposit message is synced.
    #[error("checking deposit propagation failed: {0}")]
    Propagation(GatewayError),

    #[error("deposit claim was not included within {0:?}")]
    ClaimTimeout(Duration),

    #[error("deposit claim rejected: {0}")]
    ClaimRejected(GatewayError),

    #[error("burn authorization failed: {0}")]
    Authorization(GatewayError),

    #[error("exit to L1 failed: {0}")]
    Exit(GatewayError),

    /// No witness could be obtained for the exit message before the deadline.
    #[error("membership witness unavailable: {0}")]
    WitnessUnavailable(GatewayError),

    #[error("finalizing withdrawal on L1 failed: {0}")]
    Finalize(GatewayError),

    #[error("reading {side} balance failed: {source}")]
    Balance {
        side: ChainSide,
        source: GatewayError,
    },

    #[error("minting L1 tokens failed: {0}")]
    Mint(GatewayError),
}

impl BridgeError {
    /// The gateway error behind this failure, if there is one.
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            BridgeError::ClaimSecret(e)
            | BridgeError::Escrow(e)
            | BridgeError::Propagation(e)
            | BridgeError::ClaimRejected(e)
            | BridgeError::Authorization(e)
            | BridgeError::Exit(e)
            | BridgeError::WitnessUnavailable(e)
            | BridgeError::Finalize(e)
            | BridgeError::Balance { source: e, .. }
            | BridgeError::Mint(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if repeating the operation later may succeed.
    ///
    /// Chain state is never rolled back, so a recoverable deposit failure after
    /// escrow still leaves the escrowed tokens waiting for a claim.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BridgeError::FlowAlreadyInProgress
            | BridgeError::Cancelled
            | BridgeError::PropagationTimeout { .. }
            | BridgeError::ClaimTimeout(_)
            | BridgeError::WitnessUnavailable(_) => true,

            BridgeError::ConnectionMissing(_)
            | BridgeError::GatewaysUnbound
            | BridgeError::InvalidAmount => false,

            other => other.gateway_error().is_some_and(Transient::is_transient),
        }
    }
}

impl From<Cancelled> for BridgeError {
    fn from(_: Cancelled) -> Self {
        BridgeError::Cancelled
    }
}
