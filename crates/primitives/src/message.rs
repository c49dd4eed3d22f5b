//! Cross-chain message hashing.
//!
//! Messages crossing the bridge are committed to as `sha256` digests truncated
//! to 31 bytes, so every hash is a valid rollup field element.

use alloy_primitives::{keccak256, B256, U256};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    address::{BaseAddress, RollupAddress},
    amount::Amount,
    field::FieldElement,
};

/// Solidity signature whose selector prefixes the withdrawal content.
pub const WITHDRAW_SIGNATURE: &str = "withdraw(address,uint256,address)";

/// Hashes the concatenation of `chunks` and truncates the digest into the field.
///
/// The first output byte is always zero and the remaining 31 bytes are the
/// leading bytes of the digest.
pub fn sha256_to_field<I, T>(chunks: I) -> FieldElement
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update(chunk.as_ref());
    }
    let digest = hasher.finalize();

    let mut out = [0u8; 32];
    out[1..].copy_from_slice(&digest[..31]);
    FieldElement::from_truncated(out)
}

/// Left-pads an address to a 32-byte ABI word.
pub(crate) fn address_word(address: &BaseAddress) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

pub(crate) fn u256_word(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

/// Everything that identifies a withdrawal message sent from the rollup to the
/// base chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalMessage {
    /// Bridge contract on the rollup that emits the message.
    pub l2_bridge: RollupAddress,
    pub rollup_version: u64,
    /// Portal on the base chain that consumes the message.
    pub portal: BaseAddress,
    pub l1_chain_id: u64,
    /// Receiver of the released tokens.
    pub recipient: BaseAddress,
    pub amount: Amount,
    /// Account allowed to finalize on L1; zero means anyone.
    pub caller_on_l1: BaseAddress,
}

impl WithdrawalMessage {
    /// Content hash the rollup bridge commits to when it exits.
    pub fn content(&self) -> FieldElement {
        let selector = keccak256(WITHDRAW_SIGNATURE.as_bytes());
        sha256_to_field([
            &selector[..4],
            &address_word(&self.recipient)[..],
            &u256_word(self.amount.into_inner())[..],
            &address_word(&self.caller_on_l1)[..],
        ])
    }

    /// Leaf of the outbox tree for this message.
    pub fn leaf(&self) -> FieldElement {
        sha256_to_field([
            self.l2_bridge.as_field().as_slice(),
            &u256_word(U256::from(self.rollup_version))[..],
            &address_word(&self.portal)[..],
            &u256_word(U256::from(self.l1_chain_id))[..],
            self.content().as_slice(),
        ])
    }
}

/// Where a rollup exit transaction landed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitReceipt {
    pub block_number: u64,
    pub tx_hash: B256,
}
