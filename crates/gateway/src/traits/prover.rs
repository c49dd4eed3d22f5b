use async_trait::async_trait;
use tokenbridge_primitives::{FieldElement, MembershipWitness};

use crate::GatewayError;

/// Source of inclusion proofs for L2-to-L1 messages.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait MessageProver: Send + Sync {
    /// Returns the witness for `message` in the outbox tree of `block_number`.
    ///
    /// Fails with [`GatewayError::BlockNotFinalized`] until the block is proven on L1.
    async fn membership_witness(
        &self,
        block_number: u64,
        message: FieldElement,
    ) -> Result<MembershipWitness, GatewayError>;
}
