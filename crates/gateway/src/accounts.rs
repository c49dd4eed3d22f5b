use tokenbridge_primitives::{BaseAddress, RollupAddress};

use crate::traits::AccountContext;

/// Account context fixed at construction, e.g. from a loaded key and wallet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticAccountContext {
    base: Option<BaseAddress>,
    rollup: Option<RollupAddress>,
}

impl StaticAccountContext {
    pub fn new(base: Option<BaseAddress>, rollup: Option<RollupAddress>) -> Self {
        Self { base, rollup }
    }

    pub fn connected(base: BaseAddress, rollup: RollupAddress) -> Self {
        Self::new(Some(base), Some(rollup))
    }
}

impl AccountContext for StaticAccountContext {
    fn base_address(&self) -> Option<BaseAddress> {
        self.base
    }

    fn base_connected(&self) -> bool {
        self.base.is_some()
    }

    fn rollup_address(&self) -> Option<RollupAddress> {
        self.rollup
    }

    fn rollup_connected(&self) -> bool {
        self.rollup.is_some()
    }
}
