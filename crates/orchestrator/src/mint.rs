//! Test-token faucet on L1. Sandbox networks only.

use tokenbridge_common::{
    retry::{sleep_or_cancel, with_cancellation},
    CancellationToken,
};
use tokenbridge_gateway::{
    AccountContext, FaucetGateway, MessageProver, PortalGateway, RollupGateway,
};
use tokenbridge_primitives::Amount;
use tracing::*;

use crate::{BridgeError, BridgeOrchestrator, FlowKind, FlowState};

impl<A, P, R, M> BridgeOrchestrator<A, P, R, M>
where
    A: AccountContext,
    P: PortalGateway + FaucetGateway,
    R: RollupGateway,
    M: MessageProver,
{
    /// Mints the faucet's fixed amount to the connected L1 account and returns
    /// the balance read after the settle delay.
    pub async fn try_mint_l1_tokens(&self) -> Result<Amount, BridgeError> {
        self.run_flow(FlowKind::Mint, |cancel| self.mint(cancel))
            .instrument(info_span!("mint"))
            .await
    }

    pub async fn mint_l1_tokens(&self) {
        if let Err(err) = self.try_mint_l1_tokens().await {
            self.record_error(&err);
        }
    }

    async fn mint(&self, cancel: CancellationToken) -> Result<Amount, BridgeError> {
        let l1 = self.base_account()?;
        let gateways = self.bound_gateways()?;

        self.advance(FlowState::Minting);
        let amount = with_cancellation(&cancel, gateways.portal.mint_amount())
            .await?
            .map_err(BridgeError::Mint)?;
        let receipt = with_cancellation(&cancel, gateways.portal.mint(l1))
            .await?
            .map_err(BridgeError::Mint)?;
        info!(%amount, tx = %receipt.tx_hash, "mint submitted");

        // The faucet receipt does not wait for the balance to be indexed.
        sleep_or_cancel(&cancel, self.params().mint_settle_delay()).await?;
        self.read_l1_balance(&gateways, l1).await
    }
}
