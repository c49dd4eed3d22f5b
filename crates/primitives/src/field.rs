//! Elements of the rollup's native scalar field.

use std::{fmt, str::FromStr};

use alloy_primitives::{B256, U256};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

/// Modulus of the BN254 scalar field.
pub const FIELD_MODULUS: U256 = U256::from_limbs([
    0x43e1f593f0000001,
    0x2833e84879b97091,
    0xb85045b68181585d,
    0x30644e72e131a029,
]);

/// A 32-byte big-endian value strictly below [`FIELD_MODULUS`].
///
/// Secrets, nonces, message hashes and rollup addresses are all field elements.
/// Construction always validates the range, so holding one is proof it is canonical.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "B256")]
pub struct FieldElement(B256);

impl FieldElement {
    pub const ZERO: Self = Self(B256::ZERO);

    /// Wraps `value` if it is a canonical field element.
    pub fn new(value: B256) -> Result<Self, ParseError> {
        if U256::from_be_bytes(value.0) >= FIELD_MODULUS {
            return Err(ParseError::NotInField);
        }
        Ok(Self(value))
    }

    /// Reduces an arbitrary 256-bit integer into the field.
    pub fn from_u256_reduced(value: U256) -> Self {
        let reduced = value.reduce_mod(FIELD_MODULUS);
        Self(B256::from(reduced.to_be_bytes::<32>()))
    }

    /// Builds a field element from bytes whose first byte is known to be zero.
    ///
    /// Any 31-byte value is below the modulus, so this cannot fail.
    pub(crate) fn from_truncated(bytes: [u8; 32]) -> Self {
        debug_assert_eq!(bytes[0], 0);
        Self(B256::from(bytes))
    }

    /// Draws a uniformly distributed element using `rng`.
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut buf = [0u8; 32];
        rng.fill_bytes(&mut buf);
        Self::from_u256_reduced(U256::from_be_bytes(buf))
    }

    /// Draws an element from the thread-local CSPRNG.
    pub fn random_secret() -> Self {
        Self::random(&mut rand::thread_rng())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == B256::ZERO
    }

    pub fn as_b256(&self) -> &B256 {
        &self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn to_u256(&self) -> U256 {
        U256::from_be_bytes(self.0 .0)
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self(B256::from(U256::from(value).to_be_bytes::<32>()))
    }
}

impl TryFrom<B256> for FieldElement {
    type Error = ParseError;

    fn try_from(value: B256) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<U256> for FieldElement {
    type Error = ParseError;

    fn try_from(value: U256) -> Result<Self, Self::Error> {
        Self::new(B256::from(value.to_be_bytes::<32>()))
    }
}

impl TryFrom<String> for FieldElement {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldElement> for B256 {
    fn from(value: FieldElement) -> Self {
        value.0
    }
}

impl FromStr for FieldElement {
    type Err = ParseError;

    /// Accepts hex with or without a `0x` prefix, left-padding short inputs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > 64 {
            return Err(ParseError::InvalidHex(s.to_owned()));
        }
        let value =
            U256::from_str_radix(digits, 16).map_err(|_| ParseError::InvalidHex(s.to_owned()))?;
        Self::try_from(value)
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.0)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
