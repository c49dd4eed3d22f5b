//! L2 to L1: authorize the burn, exit the rollup, prove the exit on L1.

use tokenbridge_common::{
    retry::{retry_with_backoff, with_cancellation},
    CancellationToken, WaitError,
};
use tokenbridge_gateway::{
    AccountContext, GatewayError, MessageProver, PortalGateway, RollupGateway,
};
use tokenbridge_primitives::{
    Amount, BaseAddress, ExitReceipt, FieldElement, MembershipWitness,
};
use tracing::*;

use crate::{
    orchestrator::{bounded, ensure_positive, Gateways},
    BridgeError, BridgeOrchestrator, FlowKind, FlowState, WithdrawalStage,
};

impl<A, P, R, M> BridgeOrchestrator<A, P, R, M>
where
    A: AccountContext,
    P: PortalGateway,
    R: RollupGateway,
    M: MessageProver,
{
    /// Moves `amount` from the connected rollup account back to the connected
    /// L1 account.
    ///
    /// Cancelling after the exit leaves the burned tokens claimable on L1 once
    /// the exit block is proven.
    pub async fn try_withdraw_tokens_to_l1(&self, amount: Amount) -> Result<(), BridgeError> {
        self.run_flow(FlowKind::Withdrawal, |cancel| self.withdraw(amount, cancel))
            .instrument(info_span!("withdrawal", %amount))
            .await
    }

    /// Like [`Self::try_withdraw_tokens_to_l1`], recording any failure in the
    /// session instead of returning it.
    pub async fn withdraw_tokens_to_l1(&self, amount: Amount) {
        if let Err(err) = self.try_withdraw_tokens_to_l1(amount).await {
            self.record_error(&err);
        }
    }

    async fn withdraw(&self, amount: Amount, cancel: CancellationToken) -> Result<(), BridgeError> {
        ensure_positive(amount)?;
        let l1 = self.base_account()?;
        let l2 = self.rollup_account()?;
        let gateways = self.bound_gateways()?;
        let inclusion_timeout = self.params().inclusion_timeout();

        // Scopes the authorization to this withdrawal only.
        let nonce = FieldElement::random_secret();

        self.advance(FlowState::Withdrawal(WithdrawalStage::Authorizing));
        let auth = gateways.rollup.authorize_burn(l2, amount, nonce);
        debug!(
            caller = %auth.caller(),
            nonce = %auth.action().nonce,
            "submitting burn authorization"
        );
        let submitted = gateways.rollup.submit_authorization(auth);
        bounded(&cancel, inclusion_timeout, submitted)
            .await?
            .map_err(BridgeError::Authorization)?;

        self.advance(FlowState::Withdrawal(WithdrawalStage::Exiting));
        let message = with_cancellation(
            &cancel,
            gateways.portal.withdrawal_message(
                amount,
                l1,
                gateways.rollup.bridge_address(),
                // Anyone may relay the withdrawal on L1.
                BaseAddress::ZERO,
            ),
        )
        .await?
        .map_err(BridgeError::Exit)?;
        let leaf = message.leaf();

        let exited = gateways.rollup.initiate_exit(l1, amount, nonce);
        let exit = bounded(&cancel, inclusion_timeout, exited)
            .await?
            .map_err(BridgeError::Exit)?;
        info!(block = exit.block_number, tx = %exit.tx_hash, %leaf, "exit included on L2");

        self.advance(FlowState::Withdrawal(WithdrawalStage::AwaitingFinality));
        let witness = self.await_witness(&gateways, &exit, leaf, &cancel).await?;

        self.advance(FlowState::Withdrawal(WithdrawalStage::Finalizing));
        with_cancellation(
            &cancel,
            gateways
                .portal
                .finalize_withdrawal(amount, l1, exit.block_number, witness),
        )
        .await?
        .map_err(BridgeError::Finalize)?;
        info!(%l1, "withdrawal finalized on L1");

        self.refresh_balances(&gateways, l1, l2).await;
        Ok(())
    }

    /// Fetches the exit witness, retrying while the block is not yet proven.
    async fn await_witness(
        &self,
        gateways: &Gateways<P, R, M>,
        exit: &ExitReceipt,
        leaf: FieldElement,
        cancel: &CancellationToken,
    ) -> Result<MembershipWitness, BridgeError> {
        let params = self.params();
        let prover = &gateways.prover;
        let block_number = exit.block_number;

        retry_with_backoff(
            "membership witness",
            &params.witness_retry,
            params.witness_timeout(),
            cancel,
            || prover.membership_witness(block_number, leaf),
        )
        .await
        .map_err(|err| match err {
            WaitError::Cancelled => BridgeError::Cancelled,
            WaitError::TimedOut { waited, last } => BridgeError::WitnessUnavailable(
                last.unwrap_or(GatewayError::TimeoutExceeded(waited)),
            ),
            WaitError::Failed(err) => BridgeError::WitnessUnavailable(err),
        })
    }
}
