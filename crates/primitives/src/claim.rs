use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{address::RollupAddress, amount::Amount, field::FieldElement};

/// A claim secret and the hash the rollup derives from it.
///
/// The hash is computed by the rollup (its own hash function, not one this
/// crate knows), and the L1 deposit commits to it.
#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSecret {
    secret: FieldElement,
    secret_hash: FieldElement,
}

impl ClaimSecret {
    pub fn new(secret: FieldElement, secret_hash: FieldElement) -> Self {
        Self {
            secret,
            secret_hash,
        }
    }

    pub fn secret(&self) -> &FieldElement {
        &self.secret
    }

    pub fn secret_hash(&self) -> &FieldElement {
        &self.secret_hash
    }
}

impl fmt::Debug for ClaimSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimSecret")
            .field("secret_hash", &self.secret_hash)
            .finish_non_exhaustive()
    }
}

/// Everything needed to claim an escrowed deposit on the rollup.
///
/// A claim is consumed exactly once. The rollup rejects a second claim for the
/// same `message_hash`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositClaim {
    claim_secret: FieldElement,
    claim_secret_hash: FieldElement,
    message_hash: FieldElement,
    message_leaf_index: u64,
}

impl DepositClaim {
    pub fn new(secret: ClaimSecret, message_hash: FieldElement, message_leaf_index: u64) -> Self {
        Self {
            claim_secret: secret.secret,
            claim_secret_hash: secret.secret_hash,
            message_hash,
            message_leaf_index,
        }
    }

    pub fn claim_secret(&self) -> &FieldElement {
        &self.claim_secret
    }

    pub fn claim_secret_hash(&self) -> &FieldElement {
        &self.claim_secret_hash
    }

    pub fn message_hash(&self) -> &FieldElement {
        &self.message_hash
    }

    pub fn message_leaf_index(&self) -> u64 {
        self.message_leaf_index
    }
}

// The secret never shows up in logs.
impl fmt::Debug for DepositClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DepositClaim")
            .field("claim_secret_hash", &self.claim_secret_hash)
            .field("message_hash", &self.message_hash)
            .field("message_leaf_index", &self.message_leaf_index)
            .finish_non_exhaustive()
    }
}

/// A deposit escrowed on L1 and not yet claimed on the rollup.
///
/// Carries the claim secret: serializing it is how a deposit survives a
/// failed or interrupted claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDeposit {
    pub recipient: RollupAddress,
    pub amount: Amount,
    pub claim: DepositClaim,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> ClaimSecret {
        ClaimSecret::new(FieldElement::from(0xdeadbeefu64), FieldElement::from(0x5eu64))
    }

    #[test]
    fn test_claim_keeps_rollup_hash() {
        let claim = DepositClaim::new(secret(), FieldElement::from(1u64), 4);
        assert_eq!(claim.claim_secret_hash(), &FieldElement::from(0x5eu64));
        assert_eq!(claim.claim_secret(), &FieldElement::from(0xdeadbeefu64));
        assert_eq!(claim.message_leaf_index(), 4);
    }

    #[test]
    fn test_debug_hides_secret() {
        let claim = DepositClaim::new(secret(), FieldElement::from(1u64), 0);
        let rendered = format!("{claim:?} {:?}", secret());
        assert!(!rendered.contains("deadbeef"));
        assert!(rendered.contains("message_leaf_index"));
    }

    #[test]
    fn test_pending_deposit_export_keeps_secret() {
        let pending = PendingDeposit {
            recipient: RollupAddress::from(FieldElement::from(0xa2u64)),
            amount: Amount::from(100u64),
            claim: DepositClaim::new(secret(), FieldElement::from(9u64), 2),
        };

        let exported = serde_json::to_string(&pending).unwrap();
        assert!(exported.contains("deadbeef"));

        let restored: PendingDeposit = serde_json::from_str(&exported).unwrap();
        assert_eq!(restored, pending);
        assert_eq!(restored.claim.claim_secret(), pending.claim.claim_secret());
    }
}
