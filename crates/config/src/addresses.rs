use serde::{Deserialize, Serialize};
use tokenbridge_primitives::{BaseAddress, RollupAddress};

use crate::errors::ConfigError;

/// Default base chain (Sepolia).
const DEFAULT_BASE_CHAIN_ID: u64 = 11155111;

/// Default rollup network id (local sandbox).
const DEFAULT_ROLLUP_ID: u64 = 1337;

/// Contracts deployed on the base chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Addresses {
    /// Token portal escrowing deposits and releasing withdrawals.
    pub portal: BaseAddress,
    /// Canonical ERC-20 token.
    pub token: BaseAddress,
    /// Faucet contract minting test tokens.
    pub fee_asset_handler: BaseAddress,
}

/// Contracts deployed on the rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L2Addresses {
    pub token: RollupAddress,
    pub token_bridge: RollupAddress,
}

/// Address record for one (base chain, rollup) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAddresses {
    pub base_chain_id: u64,
    pub rollup_id: u64,
    pub l1: L1Addresses,
    pub l2: L2Addresses,
}

/// Which entry of the address table to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSelector {
    #[serde(default = "default_base_chain_id")]
    pub base_chain_id: u64,
    #[serde(default = "default_rollup_id")]
    pub rollup_id: u64,
}

impl Default for NetworkSelector {
    fn default() -> Self {
        Self {
            base_chain_id: DEFAULT_BASE_CHAIN_ID,
            rollup_id: DEFAULT_ROLLUP_ID,
        }
    }
}

fn default_base_chain_id() -> u64 {
    DEFAULT_BASE_CHAIN_ID
}

fn default_rollup_id() -> u64 {
    DEFAULT_ROLLUP_ID
}

/// Contract addresses keyed by network. Loaded once and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressTable(Vec<NetworkAddresses>);

impl AddressTable {
    pub fn new(entries: Vec<NetworkAddresses>) -> Result<Self, ConfigError> {
        let table = Self(entries);
        table.check_unique()?;
        Ok(table)
    }

    /// Looks up the record for a network pair.
    pub fn resolve(&self, selector: NetworkSelector) -> Result<&NetworkAddresses, ConfigError> {
        self.0
            .iter()
            .find(|e| e.base_chain_id == selector.base_chain_id && e.rollup_id == selector.rollup_id)
            .ok_or(ConfigError::UnknownNetwork {
                base_chain_id: selector.base_chain_id,
                rollup_id: selector.rollup_id,
            })
    }

    pub(crate) fn check_unique(&self) -> Result<(), ConfigError> {
        for (i, entry) in self.0.iter().enumerate() {
            let dup = self.0[..i]
                .iter()
                .any(|e| e.base_chain_id == entry.base_chain_id && e.rollup_id == entry.rollup_id);
            if dup {
                return Err(ConfigError::DuplicateNetwork {
                    base_chain_id: entry.base_chain_id,
                    rollup_id: entry.rollup_id,
                });
            }
        }
        Ok(())
    }
}
