//! L1 to L2: escrow in the portal, wait for the message, claim on the rollup.

use tokenbridge_common::{
    retry::{poll_until, sleep_or_cancel, with_cancellation},
    CancellationToken, WaitError,
};
use tokenbridge_gateway::{
    AccountContext, GatewayError, MessageProver, PortalGateway, RollupGateway,
};
use tokenbridge_primitives::{Amount, DepositClaim, PendingDeposit};
use tracing::*;

use crate::{
    orchestrator::{bounded, ensure_positive, Gateways},
    BridgeError, BridgeOrchestrator, DepositStage, FlowKind, FlowState,
};

impl<A, P, R, M> BridgeOrchestrator<A, P, R, M>
where
    A: AccountContext,
    P: PortalGateway,
    R: RollupGateway,
    M: MessageProver,
{
    /// Moves `amount` from the connected L1 account to the connected rollup
    /// account.
    ///
    /// Returns the deposit claim, already consumed on the rollup, as a receipt.
    /// Once the tokens are escrowed the deposit is held in
    /// [`Self::pending_deposits`] until its claim goes through, so a failed or
    /// cancelled claim can be finished with [`Self::try_resume_deposit`].
    pub async fn try_bridge_tokens_to_l2(
        &self,
        amount: Amount,
    ) -> Result<DepositClaim, BridgeError> {
        self.run_flow(FlowKind::Deposit, |cancel| self.deposit(amount, cancel))
            .instrument(info_span!("deposit", %amount))
            .await
    }

    /// Like [`Self::try_bridge_tokens_to_l2`], recording any failure in the
    /// session instead of returning it.
    pub async fn bridge_tokens_to_l2(&self, amount: Amount) -> Option<DepositClaim> {
        self.try_bridge_tokens_to_l2(amount)
            .await
            .map_err(|err| self.record_error(&err))
            .ok()
    }

    /// Claims a deposit escrowed earlier, starting from the propagation wait.
    ///
    /// The deposit stays pending until the claim succeeds. A claim the rollup
    /// reports as already consumed is dropped from the pending set and still
    /// returned as an error.
    pub async fn try_resume_deposit(
        &self,
        pending: PendingDeposit,
    ) -> Result<DepositClaim, BridgeError> {
        let message = *pending.claim.message_hash();
        self.run_flow(FlowKind::Deposit, |cancel| self.resume(pending, cancel))
            .instrument(info_span!("resume_deposit", %message))
            .await
    }

    /// Like [`Self::try_resume_deposit`], recording any failure in the session.
    pub async fn resume_deposit(&self, pending: PendingDeposit) -> Option<DepositClaim> {
        self.try_resume_deposit(pending)
            .await
            .map_err(|err| self.record_error(&err))
            .ok()
    }

    async fn deposit(
        &self,
        amount: Amount,
        cancel: CancellationToken,
    ) -> Result<DepositClaim, BridgeError> {
        ensure_positive(amount)?;
        self.base_account()?;
        let l2 = self.rollup_account()?;
        let gateways = self.bound_gateways()?;

        self.advance(FlowState::Deposit(DepositStage::Escrowing));
        let secret = with_cancellation(&cancel, gateways.rollup.generate_claim_secret())
            .await?
            .map_err(BridgeError::ClaimSecret)?;
        // Public deposit: the rollup side claims with `claim_public`.
        let escrow = gateways.portal.initiate_deposit(l2, amount, false, secret);
        let claim = with_cancellation(&cancel, escrow)
            .await?
            .map_err(BridgeError::Escrow)?;
        info!(
            message = %claim.message_hash(),
            leaf_index = claim.message_leaf_index(),
            "deposit escrowed on L1"
        );

        let pending = PendingDeposit {
            recipient: l2,
            amount,
            claim,
        };
        self.hold_deposit(pending.clone());
        self.advance(FlowState::Deposit(DepositStage::AwaitingPropagation));
        self.finish_deposit(&gateways, pending, &cancel).await
    }

    async fn resume(
        &self,
        pending: PendingDeposit,
        cancel: CancellationToken,
    ) -> Result<DepositClaim, BridgeError> {
        ensure_positive(pending.amount)?;
        self.base_account()?;
        self.rollup_account()?;
        let gateways = self.bound_gateways()?;

        info!(recipient = %pending.recipient, amount = %pending.amount, "resuming deposit");
        self.hold_deposit(pending.clone());
        self.advance(FlowState::Deposit(DepositStage::AwaitingPropagation));
        self.finish_deposit(&gateways, pending, &cancel).await
    }

    /// Propagation wait and claim, shared by fresh and resumed deposits.
    async fn finish_deposit(
        &self,
        gateways: &Gateways<P, R, M>,
        pending: PendingDeposit,
        cancel: &CancellationToken,
    ) -> Result<DepositClaim, BridgeError> {
        let PendingDeposit {
            recipient,
            amount,
            claim,
        } = pending;
        self.await_propagation(gateways, &claim, cancel).await?;

        self.advance(FlowState::Deposit(DepositStage::Claiming));
        let claimed = gateways.rollup.claim_deposit(recipient, amount, &claim);
        let res = bounded(cancel, self.params().claim_timeout(), claimed)
            .await?
            .map_err(|err| match err {
                GatewayError::TimeoutExceeded(waited) => BridgeError::ClaimTimeout(waited),
                other => BridgeError::ClaimRejected(other),
            });
        match &res {
            Ok(()) | Err(BridgeError::ClaimRejected(GatewayError::ClaimAlreadyConsumed)) => {
                self.release_deposit(claim.message_hash());
            }
            Err(_) => {}
        }
        res?;
        info!(%recipient, "deposit claimed on L2");

        // Balances shown are the connected accounts'.
        let l1 = self.base_account()?;
        let l2 = self.rollup_account()?;
        self.refresh_balances(gateways, l1, l2).await;
        Ok(claim)
    }

    /// Waits until the rollup reports the deposit message as consumable.
    async fn await_propagation(
        &self,
        gateways: &Gateways<P, R, M>,
        claim: &DepositClaim,
        cancel: &CancellationToken,
    ) -> Result<(), BridgeError> {
        let params = self.params();

        let min_delay = params.propagation_min_delay();
        if !min_delay.is_zero() {
            debug!(?min_delay, "holding before the first propagation check");
            sleep_or_cancel(cancel, min_delay).await?;
        }

        let rollup = &gateways.rollup;
        let message_hash = *claim.message_hash();
        poll_until(
            "deposit propagation",
            &params.propagation_retry,
            params.propagation_timeout(),
            cancel,
            || rollup.is_message_synced(message_hash),
        )
        .await
        .map_err(|err| match err {
            WaitError::Cancelled => BridgeError::Cancelled,
            WaitError::TimedOut { waited, .. } => BridgeError::PropagationTimeout { waited },
            WaitError::Failed(err) => BridgeError::Propagation(err),
        })
    }
}
