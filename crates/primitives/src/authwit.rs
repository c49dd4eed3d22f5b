//! Scoped authorizations letting the rollup bridge burn a user's tokens.

use serde::{Deserialize, Serialize};

use crate::{address::RollupAddress, amount::Amount, field::FieldElement};

/// Token function the bridge calls to burn the withdrawn amount.
pub const BURN_PUBLIC: &str = "burn_public";

/// A public burn of `amount` from `owner`, tagged with a one-time `nonce`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnAction {
    pub owner: RollupAddress,
    pub amount: Amount,
    pub nonce: FieldElement,
}

/// Intent letting exactly one `caller` perform exactly one [`BurnAction`].
///
/// This is the request, not the witness: the wallet turns it into the
/// authorization hash the token contract checks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalAuthorization {
    caller: RollupAddress,
    action: BurnAction,
}

impl WithdrawalAuthorization {
    pub fn new(caller: RollupAddress, action: BurnAction) -> Self {
        Self { caller, action }
    }

    pub fn caller(&self) -> &RollupAddress {
        &self.caller
    }

    pub fn action(&self) -> &BurnAction {
        &self.action
    }
}
