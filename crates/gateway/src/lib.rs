//! Gateways to the two chains the bridge spans, and the prover for L2-to-L1
//! messages.
//!
//! The orchestrator only ever sees the traits in [`traits`]; the concrete
//! adapters here speak to an EVM base chain through alloy and to the rollup
//! through JSON-RPC.

mod accounts;
mod errors;
pub mod l1;
pub mod rollup;
pub mod traits;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use accounts::StaticAccountContext;
pub use errors::GatewayError;
pub use l1::AlloyPortalGateway;
pub use rollup::{InclusionTimings, NodeMessageProver, RpcRollupGateway};
#[cfg(feature = "faucet")]
pub use traits::FaucetGateway;
pub use traits::{AccountContext, MessageProver, PortalGateway, RollupGateway};
pub use types::TxReceipt;
