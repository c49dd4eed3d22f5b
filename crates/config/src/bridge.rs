use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::{
    addresses::{AddressTable, NetworkAddresses, NetworkSelector},
    errors::ConfigError,
    params::BridgeParams,
};

/// Prefix for environment overrides, e.g. `TOKENBRIDGE_ENDPOINTS__L1_RPC_URL`.
pub const ENV_PREFIX: &str = "TOKENBRIDGE";

/// RPC endpoints for both chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base chain JSON-RPC.
    pub l1_rpc_url: String,

    /// Rollup node JSON-RPC (message sync, witnesses, receipts).
    pub rollup_node_url: String,

    /// Rollup wallet JSON-RPC holding the user's rollup account.
    pub rollup_wallet_url: String,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory path for file-based logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_prefix: Option<String>,

    /// Use JSON format for logs instead of compact format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_format: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub endpoints: EndpointConfig,

    #[serde(default)]
    pub network: NetworkSelector,

    pub addresses: AddressTable,

    #[serde(default)]
    pub params: BridgeParams,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Loads the TOML file at `path`, applying `TOKENBRIDGE_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let cfg: Self = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parses a TOML document without consulting the environment.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = Config::builder()
            .add_source(File::from_str(s, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks cross-field consistency after deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.addresses.check_unique()?;
        self.active_network()?;

        let p = &self.params;
        if p.claim_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "params.claim_timeout_secs",
                reason: "must be positive".to_owned(),
            });
        }
        if p.receipt_poll_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "params.receipt_poll_ms",
                reason: "must be positive".to_owned(),
            });
        }
        for (field, retry) in [
            ("params.propagation_retry", &p.propagation_retry),
            ("params.witness_retry", &p.witness_retry),
        ] {
            if retry.multiplier < 1.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("multiplier {} is below 1.0", retry.multiplier),
                });
            }
        }
        Ok(())
    }

    /// Address record for the selected network.
    pub fn active_network(&self) -> Result<&NetworkAddresses, ConfigError> {
        self.addresses.resolve(self.network)
    }
}
