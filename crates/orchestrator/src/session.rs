use parking_lot::RwLock;
use tokenbridge_primitives::{Amount, ChainSide, FieldElement, PendingDeposit};

/// What a UI needs to render the bridge: busy flag, last error, the balances
/// from the most recent successful reads and the deposits still to be claimed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    in_flight: u32,
    last_error: Option<String>,
    l1_balance: Option<Amount>,
    l2_balance: Option<Amount>,
    pending_deposits: Vec<PendingDeposit>,
}

impl SessionState {
    /// Returns true while any operation on the session is running.
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn l1_balance(&self) -> Option<Amount> {
        self.l1_balance
    }

    pub fn l2_balance(&self) -> Option<Amount> {
        self.l2_balance
    }

    /// Deposits escrowed on L1 whose claim has not gone through.
    pub fn pending_deposits(&self) -> &[PendingDeposit] {
        &self.pending_deposits
    }

    /// Tracks `deposit` until it is claimed. Holding the same message twice
    /// keeps one record.
    pub(crate) fn hold_deposit(&mut self, deposit: PendingDeposit) {
        let hash = *deposit.claim.message_hash();
        self.release_deposit(&hash);
        self.pending_deposits.push(deposit);
    }

    pub(crate) fn release_deposit(&mut self, message_hash: &FieldElement) {
        self.pending_deposits
            .retain(|d| d.claim.message_hash() != message_hash);
    }

    pub(crate) fn set_balance(&mut self, side: ChainSide, amount: Amount) {
        match side {
            ChainSide::L1 => self.l1_balance = Some(amount),
            ChainSide::L2 => self.l2_balance = Some(amount),
        }
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Drops cached balances; they belong to accounts that may no longer be bound.
    pub(crate) fn forget_balances(&mut self) {
        self.l1_balance = None;
        self.l2_balance = None;
    }
}

/// Marks the session busy for as long as it is alive.
///
/// Dropping the guard clears the mark even if the operation's future is dropped
/// half way.
#[derive(Debug)]
pub(crate) struct LoadingGuard<'a> {
    session: &'a RwLock<SessionState>,
}

impl<'a> LoadingGuard<'a> {
    pub(crate) fn new(session: &'a RwLock<SessionState>) -> Self {
        session.write().in_flight += 1;
        Self { session }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut session = self.session.write();
        session.in_flight = session.in_flight.saturating_sub(1);
    }
}
