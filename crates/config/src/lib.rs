//! Configuration for the token bridge: endpoints, the per-network contract
//! address table and the timings every flow waits with.

mod addresses;
mod bridge;
mod errors;
mod params;

pub use addresses::{AddressTable, L1Addresses, L2Addresses, NetworkAddresses, NetworkSelector};
pub use bridge::{BridgeConfig, EndpointConfig, LoggingConfig, ENV_PREFIX};
pub use errors::ConfigError;
pub use params::BridgeParams;
