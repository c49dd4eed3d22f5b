use async_trait::async_trait;
use jsonrpsee::http_client::HttpClient;
use tokenbridge_primitives::{FieldElement, MembershipWitness};
use tracing::*;

use super::{api::RollupNodeApiClient, errors::rpc_err, gateway::http_client};
use crate::{traits::MessageProver, GatewayError};

/// [`MessageProver`] backed by the rollup node's outbox index.
#[derive(Debug, Clone)]
pub struct NodeMessageProver {
    node: HttpClient,
}

impl NodeMessageProver {
    pub fn new(node: HttpClient) -> Self {
        Self { node }
    }

    pub fn from_url(node_url: &str) -> Result<Self, GatewayError> {
        Ok(Self::new(http_client(node_url)?))
    }
}

#[async_trait]
impl MessageProver for NodeMessageProver {
    async fn membership_witness(
        &self,
        block_number: u64,
        message: FieldElement,
    ) -> Result<MembershipWitness, GatewayError> {
        let proven = self
            .node
            .get_proven_block_number()
            .await
            .map_err(|e| rpc_err("getProvenBlockNumber", e))?;
        if block_number > proven {
            trace!(block_number, proven, "exit block not proven yet");
            return Err(GatewayError::BlockNotFinalized(block_number));
        }

        let witness = self
            .node
            .get_l2_to_l1_message_membership_witness(block_number, message)
            .await
            .map_err(|e| rpc_err("getL2ToL1MessageMembershipWitness", e))?
            .ok_or(GatewayError::MessageNotFound {
                block_number,
                message,
            })?;

        Ok(MembershipWitness::new(witness.leaf_index, witness.sibling_path))
    }
}
