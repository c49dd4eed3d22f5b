//! Primitive data types shared by the token bridge crates.
//!
//! Everything here is plain data: addresses on both sides of the bridge, token
//! amounts, rollup field elements and the claim/witness records that move between
//! the two chains. Nothing in this crate talks to a chain.

#[cfg(test)]
use serde_json as _;

#[macro_use]
mod macros;

pub mod address;
pub mod amount;
pub mod authwit;
pub mod claim;
pub mod errors;
pub mod field;
pub mod message;
pub mod witness;

pub use address::{BaseAddress, ChainSide, RollupAddress};
pub use amount::Amount;
pub use authwit::{BurnAction, WithdrawalAuthorization, BURN_PUBLIC};
pub use claim::{ClaimSecret, DepositClaim, PendingDeposit};
pub use errors::ParseError;
pub use field::{FieldElement, FIELD_MODULUS};
pub use message::{sha256_to_field, ExitReceipt, WithdrawalMessage};
pub use witness::MembershipWitness;
