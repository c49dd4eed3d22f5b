//! Wires the concrete gateways into an orchestrator.

use std::{future::Future, pin::pin, sync::Arc, time::Duration};

use indicatif::ProgressBar;
use tokenbridge_common::CancellationToken;
use tokenbridge_gateway::{
    AlloyPortalGateway, InclusionTimings, NodeMessageProver, RpcRollupGateway,
    StaticAccountContext,
};
use tokenbridge_orchestrator::{
    BridgeOrchestrator, BridgeOrchestratorBuilder, FlowState, Gateways,
};
use tokio::sync::watch;
use tracing::*;

use crate::{
    errors::{DisplayableError, DisplayedError},
    settings::Settings,
};

pub type CliOrchestrator = BridgeOrchestrator<
    StaticAccountContext,
    AlloyPortalGateway,
    RpcRollupGateway,
    NodeMessageProver,
>;

/// Connects to both chains and binds the gateways for the configured network.
pub async fn connect(
    settings: &Settings,
    shutdown: CancellationToken,
) -> Result<CliOrchestrator, DisplayedError> {
    let config = &settings.config;
    let network = config
        .active_network()
        .user_error("No contract addresses for the selected network")?;
    let endpoints = &config.endpoints;

    let rollup = RpcRollupGateway::new(
        &endpoints.rollup_node_url,
        &endpoints.rollup_wallet_url,
        network.l2.clone(),
        InclusionTimings::from_params(&config.params),
    )
    .user_error("Invalid rollup endpoint URL. Check the config file")?;

    let outbox = rollup
        .outbox_address()
        .await
        .internal_error("Failed to read the outbox address from the rollup node")?;
    let rollup_version = rollup
        .rollup_version()
        .await
        .internal_error("Failed to read the rollup version")?;
    let l2_account = rollup
        .account_address()
        .await
        .internal_error("Failed to read the rollup wallet address")?;

    let portal = AlloyPortalGateway::connect(
        &endpoints.l1_rpc_url,
        settings.l1_signer()?,
        network.l1.clone(),
        outbox,
        rollup_version,
    )
    .await
    .internal_error("Failed to connect to the L1 node")?;

    if portal.l1_chain_id() != network.base_chain_id {
        return Err(DisplayedError::UserError(
            "L1 node is on a different chain than the selected network".to_owned(),
            Box::new((portal.l1_chain_id(), network.base_chain_id)),
        ));
    }

    let l1_account = portal.signer_address();
    info!(%l1_account, %l2_account, rollup_version, "connected to both chains");

    let prover = NodeMessageProver::new(rollup.node_client());
    let accounts = StaticAccountContext::connected(l1_account, l2_account);

    Ok(BridgeOrchestratorBuilder::new(Arc::new(accounts))
        .with_params(config.params.clone())
        .with_gateways(Gateways::new(portal, rollup, prover))
        .with_shutdown(shutdown)
        .build())
}

/// Drives `flow` while a spinner mirrors the published flow state.
pub async fn with_progress<F: Future>(
    mut watcher: watch::Receiver<FlowState>,
    flow: F,
) -> F::Output {
    let pb = ProgressBar::new_spinner().with_message("Starting");
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut flow = pin!(flow);
    let follow = async {
        while watcher.changed().await.is_ok() {
            let state = watcher.borrow_and_update().clone();
            pb.set_message(state.to_string());
        }
    };

    let out = tokio::select! {
        out = &mut flow => out,
        () = follow => flow.await,
    };
    pb.finish_and_clear();
    out
}
