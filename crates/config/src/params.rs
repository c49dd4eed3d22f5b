use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokenbridge_common::RetryConfig;

/// How long L1-to-L2 message propagation may take before a deposit gives up.
const DEFAULT_PROPAGATION_TIMEOUT_SECS: u64 = 600;

/// Inclusion timeout for the deposit claim on the rollup.
const DEFAULT_CLAIM_TIMEOUT_SECS: u64 = 200;

/// Inclusion timeout for other rollup transactions.
const DEFAULT_INCLUSION_TIMEOUT_SECS: u64 = 200;

/// How long to wait for the exit block to be proven.
const DEFAULT_WITNESS_TIMEOUT_SECS: u64 = 3_600;

/// Pause after a faucet mint before the balance is re-read.
const DEFAULT_MINT_SETTLE_DELAY_SECS: u64 = 5;

/// Interval between rollup receipt polls.
const DEFAULT_RECEIPT_POLL_MS: u64 = 1_000;

/// Timing and retry parameters shared by all flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeParams {
    pub propagation_timeout_secs: u64,

    /// Minimum wait after escrow before the first readiness check.
    pub propagation_min_delay_secs: u64,

    pub propagation_retry: RetryConfig,

    pub claim_timeout_secs: u64,

    pub inclusion_timeout_secs: u64,

    pub witness_timeout_secs: u64,

    pub witness_retry: RetryConfig,

    pub mint_settle_delay_secs: u64,

    pub receipt_poll_ms: u64,
}

impl Default for BridgeParams {
    fn default() -> Self {
        Self {
            propagation_timeout_secs: DEFAULT_PROPAGATION_TIMEOUT_SECS,
            propagation_min_delay_secs: 0,
            propagation_retry: RetryConfig {
                max_retries: u32::MAX,
                base_delay_ms: 2_000,
                multiplier: 1.5,
                max_delay_ms: 20_000,
            },
            claim_timeout_secs: DEFAULT_CLAIM_TIMEOUT_SECS,
            inclusion_timeout_secs: DEFAULT_INCLUSION_TIMEOUT_SECS,
            witness_timeout_secs: DEFAULT_WITNESS_TIMEOUT_SECS,
            witness_retry: RetryConfig {
                max_retries: u32::MAX,
                base_delay_ms: 5_000,
                multiplier: 1.5,
                max_delay_ms: 60_000,
            },
            mint_settle_delay_secs: DEFAULT_MINT_SETTLE_DELAY_SECS,
            receipt_poll_ms: DEFAULT_RECEIPT_POLL_MS,
        }
    }
}

impl BridgeParams {
    pub fn propagation_timeout(&self) -> Duration {
        Duration::from_secs(self.propagation_timeout_secs)
    }

    pub fn propagation_min_delay(&self) -> Duration {
        Duration::from_secs(self.propagation_min_delay_secs)
    }

    pub fn claim_timeout(&self) -> Duration {
        Duration::from_secs(self.claim_timeout_secs)
    }

    pub fn inclusion_timeout(&self) -> Duration {
        Duration::from_secs(self.inclusion_timeout_secs)
    }

    pub fn witness_timeout(&self) -> Duration {
        Duration::from_secs(self.witness_timeout_secs)
    }

    pub fn mint_settle_delay(&self) -> Duration {
        Duration::from_secs(self.mint_settle_delay_secs)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms)
    }
}
