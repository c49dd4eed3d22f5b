use std::{fmt, future::Future, sync::Arc, time::Duration};

use parking_lot::{Mutex, RwLock};
use tokenbridge_common::{retry::with_cancellation, Cancelled, CancellationToken};
use tokenbridge_config::BridgeParams;
use tokenbridge_gateway::{
    AccountContext, GatewayError, MessageProver, PortalGateway, RollupGateway,
};
use tokenbridge_primitives::{
    Amount, BaseAddress, ChainSide, FieldElement, MembershipWitness, PendingDeposit,
    RollupAddress,
};
use tokio::{
    sync::{watch, Mutex as AsyncMutex, MutexGuard},
    time::timeout,
};
use tracing::*;

use crate::{
    session::{LoadingGuard, SessionState},
    BridgeError, FlowKind, FlowState,
};

/// The adapters a bound orchestrator drives.
///
/// A set is never mutated: when the signer, account or address table changes a
/// new set is built and handed to [`BridgeOrchestrator::rebind`].
pub struct Gateways<P, R, M> {
    pub portal: Arc<P>,
    pub rollup: Arc<R>,
    pub prover: Arc<M>,
}

impl<P, R, M> Gateways<P, R, M> {
    pub fn new(portal: P, rollup: R, prover: M) -> Self {
        Self::from_shared(Arc::new(portal), Arc::new(rollup), Arc::new(prover))
    }

    /// Builds a set from adapters that are already shared, e.g. one value
    /// implementing several gateway traits.
    pub fn from_shared(portal: Arc<P>, rollup: Arc<R>, prover: Arc<M>) -> Self {
        Self {
            portal,
            rollup,
            prover,
        }
    }
}

impl<P, R, M> Clone for Gateways<P, R, M> {
    fn clone(&self) -> Self {
        Self {
            portal: self.portal.clone(),
            rollup: self.rollup.clone(),
            prover: self.prover.clone(),
        }
    }
}

impl<P, R, M> fmt::Debug for Gateways<P, R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateways").finish_non_exhaustive()
    }
}

/// Sequences deposits, withdrawals and mints across the two chains and owns the
/// session state a UI renders.
///
/// At most one flow runs at a time; a second one is rejected with
/// [`BridgeError::FlowAlreadyInProgress`]. Every operation comes in two forms:
/// `try_*` returns the error, the plain form records it in [`Self::error`] and
/// returns nothing (or `None`).
pub struct BridgeOrchestrator<A, P, R, M> {
    accounts: Arc<A>,
    gateways: RwLock<Option<Gateways<P, R, M>>>,
    session: RwLock<SessionState>,
    flow_lock: AsyncMutex<()>,
    flow_tx: watch::Sender<FlowState>,
    current_flow: Mutex<Option<CancellationToken>>,
    shutdown: CancellationToken,
    params: BridgeParams,
}

impl<A, P, R, M> fmt::Debug for BridgeOrchestrator<A, P, R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeOrchestrator")
            .field("bound", &self.gateways.read().is_some())
            .field("session", &*self.session.read())
            .field("flow", &*self.flow_tx.borrow())
            .finish_non_exhaustive()
    }
}

/// Held for the lifetime of one flow.
struct FlowGuard<'a> {
    _lock: MutexGuard<'a, ()>,
    _loading: LoadingGuard<'a>,
    kind: FlowKind,
    current: &'a Mutex<Option<CancellationToken>>,
    flow_tx: &'a watch::Sender<FlowState>,
    cancel: CancellationToken,
}

impl Drop for FlowGuard<'_> {
    fn drop(&mut self) {
        *self.current.lock() = None;

        // The flow's future was dropped before it reached a terminal state.
        let kind = self.kind;
        self.flow_tx.send_if_modified(|state| {
            if !state.is_active() {
                return false;
            }
            warn!(flow = %kind, %state, "flow abandoned");
            *state = FlowState::Failed {
                flow: kind,
                error: BridgeError::Cancelled,
            };
            true
        });
    }
}

impl<A, P, R, M> BridgeOrchestrator<A, P, R, M> {
    pub(crate) fn from_parts(
        accounts: Arc<A>,
        gateways: Option<Gateways<P, R, M>>,
        params: BridgeParams,
        shutdown: CancellationToken,
    ) -> Self {
        let (flow_tx, _) = watch::channel(FlowState::Idle);
        Self {
            accounts,
            gateways: RwLock::new(gateways),
            session: RwLock::new(SessionState::default()),
            flow_lock: AsyncMutex::new(()),
            flow_tx,
            current_flow: Mutex::new(None),
            shutdown,
            params,
        }
    }

    pub fn params(&self) -> &BridgeParams {
        &self.params
    }

    /// Returns true while any operation is running.
    pub fn loading(&self) -> bool {
        self.session.read().loading()
    }

    /// Message of the last failure, cleared when the next flow starts.
    pub fn error(&self) -> Option<String> {
        self.session.read().last_error().map(str::to_owned)
    }

    /// Last L1 balance read, in token base units.
    pub fn l1_balance(&self) -> Option<String> {
        self.session.read().l1_balance().map(|b| b.to_string())
    }

    /// Last L2 balance read, in token base units.
    pub fn l2_balance(&self) -> Option<String> {
        self.session.read().l2_balance().map(|b| b.to_string())
    }

    /// Deposits escrowed on L1 whose claim on the rollup has not gone through,
    /// oldest first. Each can be finished with [`Self::try_resume_deposit`].
    pub fn pending_deposits(&self) -> Vec<PendingDeposit> {
        self.session.read().pending_deposits().to_vec()
    }

    /// Copy of the whole session record.
    pub fn session(&self) -> SessionState {
        self.session.read().clone()
    }

    pub fn flow_state(&self) -> FlowState {
        self.flow_tx.borrow().clone()
    }

    /// Returns a watcher for flow state updates.
    pub fn flow_watcher(&self) -> watch::Receiver<FlowState> {
        self.flow_tx.subscribe()
    }

    /// Abandons the running flow at its next suspension point.
    ///
    /// Transactions already broadcast stay on chain. Returns false if no flow
    /// is running.
    pub fn cancel_flow(&self) -> bool {
        match self.current_flow.lock().as_ref() {
            Some(token) => {
                info!("cancelling running flow");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Replaces the gateways. A flow already running keeps the set it started
    /// with; cached balances are dropped.
    pub fn rebind(&self, gateways: Gateways<P, R, M>) {
        info!("binding new bridge gateways");
        *self.gateways.write() = Some(gateways);
        self.session.write().forget_balances();
    }

    /// Drops the gateways, e.g. when a wallet disconnects.
    pub fn unbind(&self) -> Option<Gateways<P, R, M>> {
        info!("unbinding bridge gateways");
        self.session.write().forget_balances();
        self.gateways.write().take()
    }

    pub(crate) fn bound_gateways(&self) -> Result<Gateways<P, R, M>, BridgeError> {
        self.gateways
            .read()
            .clone()
            .ok_or(BridgeError::GatewaysUnbound)
    }

    pub(crate) fn hold_deposit(&self, deposit: PendingDeposit) {
        self.session.write().hold_deposit(deposit);
    }

    pub(crate) fn release_deposit(&self, message_hash: &FieldElement) {
        self.session.write().release_deposit(message_hash);
    }

    pub(crate) fn record_error(&self, err: &BridgeError) {
        self.session.write().set_error(err.to_string());
    }

    /// Publishes the next flow state, refusing steps the state machine forbids.
    pub(crate) fn advance(&self, next: FlowState) {
        self.flow_tx.send_if_modified(|state| {
            if !state.can_transition_to(&next) {
                warn!(from = %state, to = %next, "ignoring illegal flow transition");
                return false;
            }
            info!(state = %next, "flow state changed");
            *state = next;
            true
        });
    }

    fn begin_flow(&self, kind: FlowKind) -> Result<FlowGuard<'_>, BridgeError> {
        let lock = self
            .flow_lock
            .try_lock()
            .map_err(|_| BridgeError::FlowAlreadyInProgress)?;

        let cancel = self.shutdown.child_token();
        *self.current_flow.lock() = Some(cancel.clone());
        let loading = LoadingGuard::new(&self.session);
        self.session.write().clear_error();
        self.flow_tx.send_if_modified(|state| {
            let reset = state.is_terminal();
            if reset {
                *state = FlowState::Idle;
            }
            reset
        });

        Ok(FlowGuard {
            _lock: lock,
            _loading: loading,
            kind,
            current: &self.current_flow,
            flow_tx: &self.flow_tx,
            cancel,
        })
    }

    /// Runs `flow` under the flow lock and publishes how it ended.
    pub(crate) async fn run_flow<T, F, Fut>(
        &self,
        kind: FlowKind,
        flow: F,
    ) -> Result<T, BridgeError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, BridgeError>>,
    {
        let guard = self.begin_flow(kind)?;
        info!(flow = %kind, "flow started");

        let res = flow(guard.cancel.clone()).await;
        match &res {
            Ok(_) => self.advance(FlowState::Settled(kind)),
            Err(error) => {
                if error.is_recoverable() {
                    warn!(flow = %kind, %error, "flow failed");
                } else {
                    error!(flow = %kind, %error, "flow failed");
                }
                self.advance(FlowState::Failed {
                    flow: kind,
                    error: error.clone(),
                });
            }
        }

        drop(guard);
        res
    }
}

impl<A, P, R, M> BridgeOrchestrator<A, P, R, M>
where
    A: AccountContext,
    P: PortalGateway,
    R: RollupGateway,
    M: MessageProver,
{
    pub(crate) fn base_account(&self) -> Result<BaseAddress, BridgeError> {
        self.accounts
            .base_address()
            .filter(|_| self.accounts.base_connected())
            .ok_or(BridgeError::ConnectionMissing(ChainSide::L1))
    }

    pub(crate) fn rollup_account(&self) -> Result<RollupAddress, BridgeError> {
        self.accounts
            .rollup_address()
            .filter(|_| self.accounts.rollup_connected())
            .ok_or(BridgeError::ConnectionMissing(ChainSide::L2))
    }

    /// Reads the L1 token balance of the connected account.
    pub async fn try_get_l1_balance(&self) -> Result<Amount, BridgeError> {
        let _loading = LoadingGuard::new(&self.session);
        let gateways = self.bound_gateways()?;
        let address = self.base_account()?;
        self.read_l1_balance(&gateways, address).await
    }

    /// Reads the L2 token balance of the connected account.
    pub async fn try_get_l2_balance(&self) -> Result<Amount, BridgeError> {
        let _loading = LoadingGuard::new(&self.session);
        let gateways = self.bound_gateways()?;
        let address = self.rollup_account()?;
        self.read_l2_balance(&gateways, address).await
    }

    pub async fn get_l1_balance(&self) {
        if let Err(err) = self.try_get_l1_balance().await {
            self.record_error(&err);
        }
    }

    pub async fn get_l2_balance(&self) {
        if let Err(err) = self.try_get_l2_balance().await {
            self.record_error(&err);
        }
    }

    pub(crate) async fn read_l1_balance(
        &self,
        gateways: &Gateways<P, R, M>,
        address: BaseAddress,
    ) -> Result<Amount, BridgeError> {
        let balance = gateways
            .portal
            .read_balance(address)
            .await
            .map_err(|source| BridgeError::Balance {
                side: ChainSide::L1,
                source,
            })
            .inspect_err(|err| warn!(%address, %err, "failed to read L1 balance"))?;

        debug!(%address, %balance, "read L1 balance");
        self.session.write().set_balance(ChainSide::L1, balance);
        Ok(balance)
    }

    pub(crate) async fn read_l2_balance(
        &self,
        gateways: &Gateways<P, R, M>,
        address: RollupAddress,
    ) -> Result<Amount, BridgeError> {
        let balance = gateways
            .rollup
            .read_balance(address)
            .await
            .map_err(|source| BridgeError::Balance {
                side: ChainSide::L2,
                source,
            })
            .inspect_err(|err| warn!(%address, %err, "failed to read L2 balance"))?;

        debug!(%address, %balance, "read L2 balance");
        self.session.write().set_balance(ChainSide::L2, balance);
        Ok(balance)
    }

    /// Re-reads both balances after a transfer settled.
    ///
    /// A failed read does not fail the transfer; it only lands in the session's
    /// error field.
    pub(crate) async fn refresh_balances(
        &self,
        gateways: &Gateways<P, R, M>,
        l1: BaseAddress,
        l2: RollupAddress,
    ) {
        let (l1_res, l2_res) = tokio::join!(
            self.read_l1_balance(gateways, l1),
            self.read_l2_balance(gateways, l2)
        );
        for err in [l1_res.err(), l2_res.err()].into_iter().flatten() {
            self.record_error(&err);
        }
    }

    /// Looks up the witness for an L2-to-L1 message once, without the
    /// withdrawal flow's retries.
    pub async fn membership_witness(
        &self,
        block_number: u64,
        message: FieldElement,
    ) -> Result<MembershipWitness, BridgeError> {
        let gateways = self.bound_gateways()?;
        debug!(%block_number, %message, "fetching membership witness");
        gateways
            .prover
            .membership_witness(block_number, message)
            .await
            .map_err(BridgeError::WitnessUnavailable)
    }
}

pub(crate) fn ensure_positive(amount: Amount) -> Result<(), BridgeError> {
    if amount.is_zero() {
        return Err(BridgeError::InvalidAmount);
    }
    Ok(())
}

/// Runs a gateway call under both `cancel` and a `limit`, reporting an overrun
/// as [`GatewayError::TimeoutExceeded`].
pub(crate) async fn bounded<T>(
    cancel: &CancellationToken,
    limit: Duration,
    fut: impl Future<Output = Result<T, GatewayError>>,
) -> Result<Result<T, GatewayError>, Cancelled> {
    with_cancellation(cancel, async {
        timeout(limit, fut)
            .await
            .unwrap_or_else(|_| Err(GatewayError::TimeoutExceeded(limit)))
    })
    .await
}
