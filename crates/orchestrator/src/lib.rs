//! Drives token transfers between the L1 base chain and the rollup.
//!
//! [`BridgeOrchestrator`] sequences the gateway calls of each flow, waits for
//! the cross-chain steps with bounded polling, and keeps the session state a UI
//! renders: a busy flag, the last error and the balances from the most recent
//! reads. Flow progress is published on a watch channel.

#[cfg(test)]
use async_trait as _;

mod builder;
mod deposit;
mod error;
#[cfg(feature = "faucet")]
mod mint;
mod orchestrator;
mod session;
mod state;
mod withdraw;

pub use builder::BridgeOrchestratorBuilder;
pub use error::BridgeError;
pub use orchestrator::{BridgeOrchestrator, Gateways};
pub use session::SessionState;
pub use state::{DepositStage, FlowKind, FlowState, WithdrawalStage};

#[cfg(test)]
mod tests;
