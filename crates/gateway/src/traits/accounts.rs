use tokenbridge_primitives::{BaseAddress, RollupAddress};

/// Identity of the user on both sides of the bridge.
///
/// Implementations may change their answers between calls (a wallet can
/// disconnect), so callers re-query on every operation instead of caching.
#[cfg_attr(feature = "test-utils", mockall::automock)]
pub trait AccountContext: Send + Sync {
    /// Address of the base-chain signer, if one is loaded.
    fn base_address(&self) -> Option<BaseAddress>;

    fn base_connected(&self) -> bool;

    /// Address of the rollup account, if one is loaded.
    fn rollup_address(&self) -> Option<RollupAddress>;

    fn rollup_connected(&self) -> bool;
}
