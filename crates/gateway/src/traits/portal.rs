use async_trait::async_trait;
use tokenbridge_primitives::{
    Amount, BaseAddress, ClaimSecret, DepositClaim, MembershipWitness, RollupAddress,
    WithdrawalMessage,
};

#[cfg(feature = "faucet")]
use crate::types::TxReceipt;
use crate::GatewayError;

/// Base-chain side of the bridge: the token portal and the canonical token.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait PortalGateway: Send + Sync {
    /// Escrows `amount` in the portal for `recipient` on the rollup.
    ///
    /// Approves the portal and deposits, committing to `secret`'s hash. The
    /// returned claim is everything the rollup needs to mint the tokens.
    async fn initiate_deposit(
        &self,
        recipient: RollupAddress,
        amount: Amount,
        private: bool,
        secret: ClaimSecret,
    ) -> Result<DepositClaim, GatewayError>;

    /// Releases a withdrawal on L1 using a proof that the exit message was
    /// included in rollup block `block_number`.
    async fn finalize_withdrawal(
        &self,
        amount: Amount,
        recipient: BaseAddress,
        block_number: u64,
        witness: MembershipWitness,
    ) -> Result<(), GatewayError>;

    async fn read_balance(&self, address: BaseAddress) -> Result<Amount, GatewayError>;

    /// Builds the message the rollup bridge will emit for this withdrawal.
    async fn withdrawal_message(
        &self,
        amount: Amount,
        recipient: BaseAddress,
        l2_bridge: RollupAddress,
        caller_on_l1: BaseAddress,
    ) -> Result<WithdrawalMessage, GatewayError>;
}

/// Test-token faucet on the base chain.
#[cfg(feature = "faucet")]
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait FaucetGateway: Send + Sync {
    /// Amount a single mint hands out.
    async fn mint_amount(&self) -> Result<Amount, GatewayError>;

    async fn mint(&self, to: BaseAddress) -> Result<TxReceipt, GatewayError>;
}
