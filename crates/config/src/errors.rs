use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("no contract addresses for base chain {base_chain_id} / rollup {rollup_id}")]
    UnknownNetwork { base_chain_id: u64, rollup_id: u64 },

    #[error("duplicate address entry for base chain {base_chain_id} / rollup {rollup_id}")]
    DuplicateNetwork { base_chain_id: u64, rollup_id: u64 },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
