use std::fmt;

pub use alloy_primitives::Address as BaseAddress;
use serde::{Deserialize, Serialize};

use crate::field::FieldElement;

/// Address of an account or contract on the rollup.
///
/// Rollup addresses are field elements, unlike the 20-byte [`BaseAddress`].
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollupAddress(FieldElement);

impl_field_wrapper!(RollupAddress);

impl RollupAddress {
    pub const ZERO: Self = Self(FieldElement::ZERO);

    pub fn as_field(&self) -> &FieldElement {
        &self.0
    }
}

/// Which side of the bridge a value lives on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainSide {
    /// The base chain holding the portal and the canonical token.
    L1,
    /// The rollup holding the bridged token.
    L2,
}

impl fmt::Display for ChainSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L1 => f.write_str("L1"),
            Self::L2 => f.write_str("L2"),
        }
    }
}
