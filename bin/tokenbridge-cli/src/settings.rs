use std::{env::var, fmt, path::PathBuf, str::FromStr};

use alloy::signers::local::PrivateKeySigner;
use directories::ProjectDirs;
use tokenbridge_common::logging::{FileLoggingConfig, LoggerConfig};
use tokenbridge_config::BridgeConfig;
use tracing::level_filters::LevelFilter;

use crate::errors::{DisplayableError, DisplayedError};

/// Overrides the config file location.
pub const CONFIG_FILE_ENV: &str = "TOKENBRIDGE_CONFIG";

/// Hex-encoded private key of the L1 account that signs portal transactions.
pub const L1_PRIVATE_KEY_ENV: &str = "TOKENBRIDGE_L1_PRIVATE_KEY";

const LOG_FILE_PREFIX: &str = "tokenbridge";

/// Settings loaded from the config file and the environment.
///
/// The L1 key is only parsed by commands that sign, so read-only commands run
/// without it.
pub struct Settings {
    pub config: BridgeConfig,
    pub config_file: PathBuf,
    l1_private_key: Option<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("config", &self.config)
            .field("config_file", &self.config_file)
            .field("has_l1_private_key", &self.l1_private_key.is_some())
            .finish()
    }
}

impl Settings {
    pub fn load() -> Result<Self, DisplayedError> {
        let config_file = config_file_path()?;
        let config = BridgeConfig::load(&config_file).user_error(format!(
            "Failed to load config from {}. Check the config file",
            config_file.display()
        ))?;

        Ok(Self {
            config,
            config_file,
            l1_private_key: var(L1_PRIVATE_KEY_ENV).ok(),
        })
    }

    /// Signer for portal transactions; fails if the key is absent or malformed.
    pub fn l1_signer(&self) -> Result<PrivateKeySigner, DisplayedError> {
        signer_from(self.l1_private_key.as_deref())
    }

    /// Logs go to stderr so command output stays clean on stdout.
    pub fn logger_config(&self, verbose: bool) -> LoggerConfig {
        let logging = &self.config.logging;
        let json = logging.json_format.unwrap_or(false);
        let level = if verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::WARN
        };

        let mut cfg = LoggerConfig::new("tokenbridge-cli".to_owned())
            .with_default_level(level)
            .with_stderr(true)
            .with_json_logging(json);
        if let Some(dir) = &logging.log_dir {
            let prefix = logging
                .log_file_prefix
                .clone()
                .unwrap_or_else(|| LOG_FILE_PREFIX.to_owned());
            cfg = cfg.with_file_logging(
                FileLoggingConfig::new(dir.clone(), prefix).with_json_format(json),
            );
        }
        cfg
    }
}

fn config_file_path() -> Result<PathBuf, DisplayedError> {
    if let Ok(path) = var(CONFIG_FILE_ENV) {
        return Ok(PathBuf::from(path));
    }
    let dirs = ProjectDirs::from("io", "tokenbridge", "tokenbridge")
        .ok_or("no home directory")
        .user_error(format!("Set {CONFIG_FILE_ENV} to the config file path"))?;
    Ok(dirs.config_dir().join("config.toml"))
}

fn signer_from(key: Option<&str>) -> Result<PrivateKeySigner, DisplayedError> {
    let key = key
        .ok_or("not set")
        .user_error(format!("{L1_PRIVATE_KEY_ENV} must be set"))?;
    parse_private_key(key)
}

fn parse_private_key(key: &str) -> Result<PrivateKeySigner, DisplayedError> {
    PrivateKeySigner::from_str(key.trim())
        .user_error(format!("Invalid {L1_PRIVATE_KEY_ENV}. Expected a 32-byte hex key"))
}
