mod accounts;
mod portal;
mod prover;
mod rollup;

#[cfg(feature = "test-utils")]
pub use accounts::MockAccountContext;
pub use accounts::AccountContext;
#[cfg(all(feature = "faucet", feature = "test-utils"))]
pub use portal::MockFaucetGateway;
#[cfg(feature = "test-utils")]
pub use portal::MockPortalGateway;
#[cfg(feature = "faucet")]
pub use portal::FaucetGateway;
pub use portal::PortalGateway;
#[cfg(feature = "test-utils")]
pub use prover::MockMessageProver;
pub use prover::MessageProver;
#[cfg(feature = "test-utils")]
pub use rollup::MockRollupGateway;
pub use rollup::RollupGateway;
