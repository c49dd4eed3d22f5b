//! Rollup adapters speaking JSON-RPC to the rollup node and the user's wallet.

mod api;
mod errors;
mod gateway;
mod prover;

pub use api::{
    AuthWitIntent, FunctionCall, RollupNodeApiClient, RollupWalletApiClient,
    RpcL1ContractAddresses, RpcMembershipWitness, RpcTxReceipt, RpcTxStatus,
};
pub use gateway::{InclusionTimings, RpcRollupGateway};
pub use prover::NodeMessageProver;
