use async_trait::async_trait;
use tokenbridge_primitives::{
    Amount, BaseAddress, ClaimSecret, DepositClaim, ExitReceipt, FieldElement, RollupAddress,
    WithdrawalAuthorization,
};

use crate::GatewayError;

/// Rollup side of the bridge: the bridged token and its bridge contract.
///
/// Every state-changing call waits for inclusion before returning.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait RollupGateway: Send + Sync {
    /// Draws a fresh claim secret and hashes it the way the bridge contract
    /// will when the deposit is claimed.
    async fn generate_claim_secret(&self) -> Result<ClaimSecret, GatewayError>;

    /// Consumes the deposit message and mints `amount` to `recipient`.
    async fn claim_deposit(
        &self,
        recipient: RollupAddress,
        amount: Amount,
        claim: &DepositClaim,
    ) -> Result<(), GatewayError>;

    /// Builds the authorization letting the bridge burn `amount` from `owner`.
    fn authorize_burn(
        &self,
        owner: RollupAddress,
        amount: Amount,
        nonce: FieldElement,
    ) -> WithdrawalAuthorization;

    /// Has the wallet publish the authorization for `auth` and waits for it to land.
    async fn submit_authorization(&self, auth: WithdrawalAuthorization)
        -> Result<(), GatewayError>;

    /// Burns the authorized tokens and emits the L2-to-L1 withdrawal message.
    async fn initiate_exit(
        &self,
        recipient: BaseAddress,
        amount: Amount,
        nonce: FieldElement,
    ) -> Result<ExitReceipt, GatewayError>;

    async fn read_balance(&self, address: RollupAddress) -> Result<Amount, GatewayError>;

    /// Whether the L1-to-L2 message `message_hash` can be consumed yet.
    async fn is_message_synced(&self, message_hash: FieldElement) -> Result<bool, GatewayError>;

    fn bridge_address(&self) -> RollupAddress;
}
