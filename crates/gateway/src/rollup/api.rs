use alloy::primitives::{Address, B256};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use serde::{Deserialize, Serialize};
use tokenbridge_primitives::{FieldElement, RollupAddress};

/// A public function call on a rollup contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub to: RollupAddress,
    pub function: String,
    pub args: Vec<serde_json::Value>,
}

impl FunctionCall {
    pub fn new(to: RollupAddress, function: &str, args: Vec<serde_json::Value>) -> Self {
        Self {
            to,
            function: function.to_owned(),
            args,
        }
    }
}

/// Asks the wallet to let `caller` perform `action` on the account's behalf.
///
/// The wallet derives the authorization hash itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthWitIntent {
    pub caller: RollupAddress,
    pub action: FunctionCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcL1ContractAddresses {
    pub outbox_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcMembershipWitness {
    pub leaf_index: u64,
    pub sibling_path: Vec<B256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcTxStatus {
    Pending,
    Success,
    Reverted,
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTxReceipt {
    pub tx_hash: B256,
    pub status: RpcTxStatus,
    #[serde(default)]
    pub block_number: Option<u64>,
    /// Revert or drop reason reported by the node.
    #[serde(default)]
    pub error: Option<String>,
}

/// Read-side methods of the rollup node.
#[rpc(client, namespace = "node")]
pub trait RollupNodeApi {
    #[method(name = "getVersion")]
    async fn get_version(&self) -> RpcResult<u64>;

    #[method(name = "getL1ContractAddresses")]
    async fn get_l1_contract_addresses(&self) -> RpcResult<RpcL1ContractAddresses>;

    /// Whether an L1-to-L2 message is in the rollup's message tree.
    #[method(name = "isL1ToL2MessageSynced")]
    async fn is_l1_to_l2_message_synced(&self, message_hash: FieldElement) -> RpcResult<bool>;

    /// Latest rollup block whose proof has landed on L1.
    #[method(name = "getProvenBlockNumber")]
    async fn get_proven_block_number(&self) -> RpcResult<u64>;

    #[method(name = "getL2ToL1MessageMembershipWitness")]
    async fn get_l2_to_l1_message_membership_witness(
        &self,
        block_number: u64,
        message: FieldElement,
    ) -> RpcResult<Option<RpcMembershipWitness>>;

    #[method(name = "getTxReceipt")]
    async fn get_tx_receipt(&self, tx_hash: B256) -> RpcResult<RpcTxReceipt>;
}

/// Wallet holding the user's rollup account; signs and sends on its behalf.
#[rpc(client, namespace = "wallet")]
pub trait RollupWalletApi {
    #[method(name = "getAddress")]
    async fn get_address(&self) -> RpcResult<RollupAddress>;

    /// Runs a call without sending it and returns its return values.
    #[method(name = "simulate")]
    async fn simulate(&self, call: FunctionCall) -> RpcResult<Vec<FieldElement>>;

    /// Proves and sends the calls as one transaction, returning its hash.
    #[method(name = "sendBatch")]
    async fn send_batch(&self, calls: Vec<FunctionCall>) -> RpcResult<B256>;

    /// Hash the rollup's bridge contract expects a deposit to commit to.
    #[method(name = "computeSecretHash")]
    async fn compute_secret_hash(&self, secret: FieldElement) -> RpcResult<FieldElement>;

    #[method(name = "setPublicAuthWit")]
    async fn set_public_auth_wit(&self, intent: AuthWitIntent, authorized: bool)
        -> RpcResult<B256>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_receipt_wire_format() {
        let raw = json!({
            "txHash": B256::repeat_byte(1),
            "status": "reverted",
            "blockNumber": 12,
            "error": "Assertion failed: unauthorized",
        });
        let receipt: RpcTxReceipt = serde_json::from_value(raw).unwrap();
        assert_eq!(receipt.status, RpcTxStatus::Reverted);
        assert_eq!(receipt.block_number, Some(12));

        let pending: RpcTxReceipt = serde_json::from_value(json!({
            "txHash": B256::ZERO,
            "status": "pending",
        }))
        .unwrap();
        assert_eq!(pending.block_number, None);
        assert!(pending.error.is_none());
    }

    #[test]
    fn test_witness_wire_format() {
        let w: RpcMembershipWitness = serde_json::from_value(json!({
            "leafIndex": 3,
            "siblingPath": [B256::repeat_byte(2)],
        }))
        .unwrap();
        assert_eq!(w.leaf_index, 3);
        assert_eq!(w.sibling_path.len(), 1);
    }
}
