//! An in-memory bridge ledger implementing every gateway trait.
//!
//! Models just enough of both chains to exercise the flows end to end: token
//! balances on each side, the L1-to-L2 inbox with single-use messages, burn
//! authorizations, and a per-block outbox tree that witnesses are checked
//! against.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use alloy::primitives::{B256, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokenbridge_primitives::{
    sha256_to_field, Amount, BaseAddress, BurnAction, ClaimSecret, DepositClaim, ExitReceipt, FieldElement, MembershipWitness, RollupAddress, WithdrawalAuthorization,
    WithdrawalMessage,
};

#[cfg(feature = "faucet")]
use crate::{traits::FaucetGateway, types::TxReceipt};
use crate::{
    traits::{MessageProver, PortalGateway, RollupGateway},
    GatewayError,
};

pub const TEST_PORTAL: BaseAddress = BaseAddress::repeat_byte(0xb0);
pub const TEST_L1_CHAIN_ID: u64 = 31337;
pub const TEST_ROLLUP_VERSION: u64 = 1;

#[derive(Debug)]
struct InboxEntry {
    recipient: Option<RollupAddress>,
    amount: Amount,
    secret_hash: FieldElement,
    sync_checks: u32,
    consumed: bool,
}

#[derive(Debug, Default)]
struct Ledger {
    l1_balances: HashMap<BaseAddress, Amount>,
    l2_balances: HashMap<RollupAddress, Amount>,
    inbox: HashMap<FieldElement, InboxEntry>,
    next_inbox_index: u64,
    /// Number of `is_message_synced` calls before a message becomes claimable.
    sync_delay: u32,
    authwits: Vec<WithdrawalAuthorization>,
    used_nonces: HashSet<FieldElement>,
    outbox: BTreeMap<u64, Vec<FieldElement>>,
    l2_block: u64,
    proven_block: u64,
    auto_prove: bool,
    consumed_outbox: HashSet<(u64, u64)>,
    corrupt_witnesses: bool,
    mint_amount: Amount,
    tx_counter: u64,
}

impl Ledger {
    fn next_tx_hash(&mut self) -> B256 {
        self.tx_counter += 1;
        B256::from(U256::from(self.tx_counter).to_be_bytes::<32>())
    }
}

/// Shared handle on an in-memory ledger. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct LocalBridge {
    ledger: Arc<Mutex<Ledger>>,
    l1_account: BaseAddress,
    l2_account: RollupAddress,
    l2_bridge: RollupAddress,
}

impl LocalBridge {
    /// Creates a ledger where `l1_account` signs on L1 and `l2_account` on the rollup.
    pub fn new(l1_account: BaseAddress, l2_account: RollupAddress) -> Self {
        let ledger = Ledger {
            auto_prove: true,
            mint_amount: Amount::from(1_000u64),
            ..Default::default()
        };
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            l1_account,
            l2_account,
            l2_bridge: RollupAddress::from(FieldElement::from(0xb41du64)),
        }
    }

    pub fn fund_l1(&self, address: BaseAddress, amount: Amount) {
        self.ledger.lock().l1_balances.insert(address, amount);
    }

    pub fn fund_l2(&self, address: RollupAddress, amount: Amount) {
        self.ledger.lock().l2_balances.insert(address, amount);
    }

    pub fn l1_balance(&self, address: BaseAddress) -> Amount {
        self.ledger
            .lock()
            .l1_balances
            .get(&address)
            .copied()
            .unwrap_or_default()
    }

    pub fn l2_balance(&self, address: RollupAddress) -> Amount {
        self.ledger
            .lock()
            .l2_balances
            .get(&address)
            .copied()
            .unwrap_or_default()
    }

    /// Messages become claimable after `checks` readiness queries.
    pub fn set_sync_delay(&self, checks: u32) {
        self.ledger.lock().sync_delay = checks;
    }

    /// When off, exit blocks stay unproven until [`Self::prove_up_to`].
    pub fn set_auto_prove(&self, enabled: bool) {
        self.ledger.lock().auto_prove = enabled;
    }

    pub fn prove_up_to(&self, block_number: u64) {
        let mut ledger = self.ledger.lock();
        ledger.proven_block = ledger.proven_block.max(block_number);
    }

    /// Makes the prover hand out witnesses for the wrong leaf.
    pub fn set_corrupt_witnesses(&self, enabled: bool) {
        self.ledger.lock().corrupt_witnesses = enabled;
    }

    pub fn set_mint_amount(&self, amount: Amount) {
        self.ledger.lock().mint_amount = amount;
    }

    pub fn latest_l2_block(&self) -> u64 {
        self.ledger.lock().l2_block
    }

    fn message_for(&self, amount: Amount, recipient: BaseAddress) -> WithdrawalMessage {
        WithdrawalMessage {
            l2_bridge: self.l2_bridge,
            rollup_version: TEST_ROLLUP_VERSION,
            portal: TEST_PORTAL,
            l1_chain_id: TEST_L1_CHAIN_ID,
            recipient,
            amount,
            caller_on_l1: BaseAddress::ZERO,
        }
    }
}

/// The ledger's own secret hash; a real rollup uses its native hash.
fn local_secret_hash(secret: &FieldElement) -> FieldElement {
    sha256_to_field([&b"local_claim_secret"[..], secret.as_slice()])
}

fn inbox_message_hash(
    recipient: Option<RollupAddress>,
    amount: Amount,
    secret_hash: &FieldElement,
    index: u64,
) -> FieldElement {
    let recipient = recipient.unwrap_or_default();
    sha256_to_field([
        recipient.as_field().as_slice(),
        &amount.into_inner().to_be_bytes::<32>()[..],
        secret_hash.as_slice(),
        &index.to_be_bytes()[..],
    ])
}

fn hash_pair(left: &B256, right: &B256) -> B256 {
    sha256_to_field([left.as_slice(), right.as_slice()]).into()
}

/// Pads `leaves` to a power of two and returns every tree level, leaves first.
fn tree_levels(leaves: &[FieldElement]) -> Vec<Vec<B256>> {
    let width = leaves.len().max(2).next_power_of_two();
    let mut level: Vec<B256> = leaves.iter().map(|l| *l.as_b256()).collect();
    level.resize(width, B256::ZERO);

    let mut levels = vec![level];
    while levels.last().map_or(0, Vec::len) > 1 {
        let prev = &levels[levels.len() - 1];
        let next: Vec<B256> = prev.chunks(2).map(|c| hash_pair(&c[0], &c[1])).collect();
        levels.push(next);
    }
    levels
}

fn tree_root(leaves: &[FieldElement]) -> B256 {
    tree_levels(leaves)
        .last()
        .and_then(|l| l.first().copied())
        .unwrap_or_default()
}

fn sibling_path(leaves: &[FieldElement], index: usize) -> Vec<B256> {
    let levels = tree_levels(leaves);
    let mut idx = index;
    let mut path = Vec::with_capacity(levels.len() - 1);
    for level in &levels[..levels.len() - 1] {
        path.push(level[idx ^ 1]);
        idx >>= 1;
    }
    path
}

#[async_trait]
impl PortalGateway for LocalBridge {
    async fn initiate_deposit(
        &self,
        recipient: RollupAddress,
        amount: Amount,
        private: bool,
        secret: ClaimSecret,
    ) -> Result<DepositClaim, GatewayError> {
        let mut ledger = self.ledger.lock();
        let available = ledger
            .l1_balances
            .get(&self.l1_account)
            .copied()
            .unwrap_or_default();
        let remaining = available
            .checked_sub(amount)
            .ok_or(GatewayError::InsufficientFunds {
                available,
                required: amount,
            })?;
        ledger.l1_balances.insert(self.l1_account, remaining);

        let secret_hash = *secret.secret_hash();
        let index = ledger.next_inbox_index;
        ledger.next_inbox_index += 1;

        let recipient = (!private).then_some(recipient);
        let message_hash = inbox_message_hash(recipient, amount, &secret_hash, index);
        ledger.inbox.insert(
            message_hash,
            InboxEntry {
                recipient,
                amount,
                secret_hash,
                sync_checks: 0,
                consumed: false,
            },
        );

        Ok(DepositClaim::new(secret, message_hash, index))
    }

    async fn finalize_withdrawal(
        &self,
        amount: Amount,
        recipient: BaseAddress,
        block_number: u64,
        witness: MembershipWitness,
    ) -> Result<(), GatewayError> {
        let leaf = self.message_for(amount, recipient).leaf();
        let mut ledger = self.ledger.lock();

        if ledger
            .consumed_outbox
            .contains(&(block_number, witness.leaf_index()))
        {
            return Err(GatewayError::MessageAlreadyClaimed);
        }
        if block_number > ledger.proven_block {
            return Err(GatewayError::ProofInvalid(format!(
                "block {block_number} has no root on L1"
            )));
        }
        let root = ledger
            .outbox
            .get(&block_number)
            .map(|leaves| tree_root(leaves))
            .ok_or_else(|| GatewayError::ProofInvalid(format!("no outbox for {block_number}")))?;
        if witness.compute_root(&leaf) != root {
            return Err(GatewayError::ProofInvalid("root mismatch".to_owned()));
        }

        ledger
            .consumed_outbox
            .insert((block_number, witness.leaf_index()));
        let balance = ledger.l1_balances.entry(recipient).or_default();
        *balance = balance.checked_add(amount).unwrap_or(*balance);
        Ok(())
    }

    async fn read_balance(&self, address: BaseAddress) -> Result<Amount, GatewayError> {
        Ok(self.l1_balance(address))
    }

    async fn withdrawal_message(
        &self,
        amount: Amount,
        recipient: BaseAddress,
        l2_bridge: RollupAddress,
        caller_on_l1: BaseAddress,
    ) -> Result<WithdrawalMessage, GatewayError> {
        Ok(WithdrawalMessage {
            l2_bridge,
            caller_on_l1,
            ..self.message_for(amount, recipient)
        })
    }
}

#[cfg(feature = "faucet")]
#[async_trait]
impl FaucetGateway for LocalBridge {
    async fn mint_amount(&self) -> Result<Amount, GatewayError> {
        Ok(self.ledger.lock().mint_amount)
    }

    async fn mint(&self, to: BaseAddress) -> Result<TxReceipt, GatewayError> {
        let mut ledger = self.ledger.lock();
        let minted = ledger.mint_amount;
        let balance = ledger.l1_balances.entry(to).or_default();
        *balance = balance
            .checked_add(minted)
            .ok_or_else(|| GatewayError::TransactionRejected("balance overflow".to_owned()))?;
        Ok(TxReceipt {
            tx_hash: ledger.next_tx_hash(),
            block_number: None,
        })
    }
}

#[async_trait]
impl RollupGateway for LocalBridge {
    async fn generate_claim_secret(&self) -> Result<ClaimSecret, GatewayError> {
        let secret = FieldElement::random_secret();
        Ok(ClaimSecret::new(secret, local_secret_hash(&secret)))
    }

    async fn claim_deposit(
        &self,
        recipient: RollupAddress,
        amount: Amount,
        claim: &DepositClaim,
    ) -> Result<(), GatewayError> {
        let mut ledger = self.ledger.lock();
        let sync_delay = ledger.sync_delay;
        let entry = ledger
            .inbox
            .get_mut(claim.message_hash())
            .ok_or(GatewayError::MessageNotYetAvailable)?;

        if entry.sync_checks < sync_delay {
            return Err(GatewayError::MessageNotYetAvailable);
        }
        if entry.consumed {
            return Err(GatewayError::ClaimAlreadyConsumed);
        }
        let matches = local_secret_hash(claim.claim_secret()) == entry.secret_hash
            && entry.amount == amount
            && entry.recipient.map_or(true, |r| r == recipient);
        if !matches {
            return Err(GatewayError::TransactionRejected(
                "claim does not match message content".to_owned(),
            ));
        }

        entry.consumed = true;
        let balance = ledger.l2_balances.entry(recipient).or_default();
        *balance = balance.checked_add(amount).unwrap_or(*balance);
        ledger.next_tx_hash();
        Ok(())
    }

    fn authorize_burn(
        &self,
        owner: RollupAddress,
        amount: Amount,
        nonce: FieldElement,
    ) -> WithdrawalAuthorization {
        WithdrawalAuthorization::new(
            self.l2_bridge,
            BurnAction {
                owner,
                amount,
                nonce,
            },
        )
    }

    async fn submit_authorization(
        &self,
        auth: WithdrawalAuthorization,
    ) -> Result<(), GatewayError> {
        if auth.caller() != &self.l2_bridge {
            return Err(GatewayError::TransactionRejected(
                "authorization names the wrong caller".to_owned(),
            ));
        }
        self.ledger.lock().authwits.push(auth);
        Ok(())
    }

    async fn initiate_exit(
        &self,
        recipient: BaseAddress,
        amount: Amount,
        nonce: FieldElement,
    ) -> Result<ExitReceipt, GatewayError> {
        let auth = self.authorize_burn(self.l2_account, amount, nonce);
        let leaf = self.message_for(amount, recipient).leaf();
        let mut ledger = self.ledger.lock();

        if ledger.used_nonces.contains(&nonce) || !ledger.authwits.contains(&auth) {
            return Err(GatewayError::AuthorizationMissing);
        }
        let available = ledger
            .l2_balances
            .get(&self.l2_account)
            .copied()
            .unwrap_or_default();
        let remaining = available
            .checked_sub(amount)
            .ok_or(GatewayError::InsufficientFunds {
                available,
                required: amount,
            })?;

        ledger.authwits.retain(|a| a != &auth);
        ledger.used_nonces.insert(nonce);
        ledger.l2_balances.insert(self.l2_account, remaining);

        ledger.l2_block += 1;
        let block_number = ledger.l2_block;
        // A filler leaf keeps the sibling path non-trivial.
        let filler = sha256_to_field([&block_number.to_be_bytes()[..]]);
        ledger.outbox.insert(block_number, vec![filler, leaf]);
        if ledger.auto_prove {
            ledger.proven_block = block_number;
        }

        Ok(ExitReceipt {
            block_number,
            tx_hash: ledger.next_tx_hash(),
        })
    }

    async fn read_balance(&self, address: RollupAddress) -> Result<Amount, GatewayError> {
        Ok(self.l2_balance(address))
    }

    async fn is_message_synced(&self, message_hash: FieldElement) -> Result<bool, GatewayError> {
        let mut ledger = self.ledger.lock();
        let sync_delay = ledger.sync_delay;
        let Some(entry) = ledger.inbox.get_mut(&message_hash) else {
            return Ok(false);
        };
        entry.sync_checks = entry.sync_checks.saturating_add(1);
        Ok(entry.sync_checks >= sync_delay)
    }

    fn bridge_address(&self) -> RollupAddress {
        self.l2_bridge
    }
}

#[async_trait]
impl MessageProver for LocalBridge {
    async fn membership_witness(
        &self,
        block_number: u64,
        message: FieldElement,
    ) -> Result<MembershipWitness, GatewayError> {
        let ledger = self.ledger.lock();
        if block_number > ledger.proven_block {
            return Err(GatewayError::BlockNotFinalized(block_number));
        }
        let not_found = GatewayError::MessageNotFound {
            block_number,
            message,
        };
        let leaves = ledger.outbox.get(&block_number).ok_or(not_found.clone())?;
        let index = leaves.iter().position(|l| *l == message).ok_or(not_found)?;

        let index = if ledger.corrupt_witnesses {
            index ^ 1
        } else {
            index
        };
        Ok(MembershipWitness::new(
            index as u64,
            sibling_path(leaves, index),
        ))
    }
}
