use std::sync::Arc;

use tokenbridge_common::CancellationToken;
use tokenbridge_config::BridgeParams;

use crate::{BridgeOrchestrator, Gateways};

/// Builder for creating a bridge orchestrator with custom configuration.
#[derive(Debug)]
pub struct BridgeOrchestratorBuilder<A, P, R, M> {
    accounts: Arc<A>,
    params: Option<BridgeParams>,
    gateways: Option<Gateways<P, R, M>>,
    shutdown: Option<CancellationToken>,
}

impl<A, P, R, M> BridgeOrchestratorBuilder<A, P, R, M> {
    /// Creates a builder around the account context, the only required input.
    pub fn new(accounts: Arc<A>) -> Self {
        Self {
            accounts,
            params: None,
            gateways: None,
            shutdown: None,
        }
    }

    /// Sets the timing and retry parameters.
    pub fn with_params(mut self, params: BridgeParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Binds gateways up front instead of through a later `rebind`.
    pub fn with_gateways(mut self, gateways: Gateways<P, R, M>) -> Self {
        self.gateways = Some(gateways);
        self
    }

    /// Sets a process-wide token; cancelling it aborts every flow.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    pub fn build(self) -> BridgeOrchestrator<A, P, R, M> {
        BridgeOrchestrator::from_parts(
            self.accounts,
            self.gateways,
            self.params.unwrap_or_default(),
            self.shutdown.unwrap_or_default(),
        )
    }
}
