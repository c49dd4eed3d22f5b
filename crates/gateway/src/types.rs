use alloy::primitives::B256;
use serde::{Deserialize, Serialize};

/// Minimal receipt for an L1 transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}
