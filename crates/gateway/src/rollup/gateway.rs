use std::time::Duration;

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde_json::json;
use tokenbridge_common::Transient;
use tokenbridge_config::{BridgeParams, L2Addresses};
use tokenbridge_primitives::{
    Amount, BaseAddress, BurnAction, ClaimSecret, DepositClaim, ExitReceipt, FieldElement,
    RollupAddress, WithdrawalAuthorization, BURN_PUBLIC,
};
use tokio::time::{sleep, timeout};
use tracing::*;

use super::{
    api::{AuthWitIntent, FunctionCall, RollupNodeApiClient, RollupWalletApiClient, RpcTxReceipt, RpcTxStatus},
    errors::{classify_revert, rpc_err},
};
use crate::{traits::RollupGateway, GatewayError};

/// How long rollup transactions may take to be included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InclusionTimings {
    /// Inclusion deadline for deposit claims.
    pub claim_timeout: Duration,
    /// Inclusion deadline for every other transaction.
    pub inclusion_timeout: Duration,
    pub poll_interval: Duration,
}

impl InclusionTimings {
    pub fn from_params(params: &BridgeParams) -> Self {
        Self {
            claim_timeout: params.claim_timeout(),
            inclusion_timeout: params.inclusion_timeout(),
            poll_interval: params.receipt_poll_interval(),
        }
    }
}

/// The wallet request authorizing `auth`: the bridge calling `burn_public` on
/// the token with the owner, amount and nonce of the burn.
pub(crate) fn auth_wit_intent(
    token: RollupAddress,
    auth: &WithdrawalAuthorization,
) -> AuthWitIntent {
    let burn = auth.action();
    AuthWitIntent {
        caller: *auth.caller(),
        action: FunctionCall::new(
            token,
            BURN_PUBLIC,
            vec![json!(burn.owner), json!(burn.amount), json!(burn.nonce)],
        ),
    }
}

pub(crate) fn http_client(url: &str) -> Result<HttpClient, GatewayError> {
    HttpClientBuilder::default()
        .build(url)
        .map_err(|e| GatewayError::rpc(format!("invalid rollup rpc url {url}: {e}")))
}

/// [`RollupGateway`] over the rollup node and wallet JSON-RPC endpoints.
#[derive(Debug, Clone)]
pub struct RpcRollupGateway {
    node: HttpClient,
    wallet: HttpClient,
    addresses: L2Addresses,
    timings: InclusionTimings,
}

impl RpcRollupGateway {
    pub fn new(
        node_url: &str,
        wallet_url: &str,
        addresses: L2Addresses,
        timings: InclusionTimings,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            node: http_client(node_url)?,
            wallet: http_client(wallet_url)?,
            addresses,
            timings,
        })
    }

    /// Handle on the node client, shared with the message prover.
    pub fn node_client(&self) -> HttpClient {
        self.node.clone()
    }

    /// Address of the account the wallet signs for.
    pub async fn account_address(&self) -> Result<RollupAddress, GatewayError> {
        self.wallet
            .get_address()
            .await
            .map_err(|e| rpc_err("getAddress", e))
    }

    pub async fn rollup_version(&self) -> Result<u64, GatewayError> {
        self.node
            .get_version()
            .await
            .map_err(|e| rpc_err("getVersion", e))
    }

    /// Outbox contract on L1 that the rollup settles withdrawals to.
    pub async fn outbox_address(&self) -> Result<Address, GatewayError> {
        self.node
            .get_l1_contract_addresses()
            .await
            .map(|a| a.outbox_address)
            .map_err(|e| rpc_err("getL1ContractAddresses", e))
    }

    async fn send_and_wait(
        &self,
        what: &'static str,
        calls: Vec<FunctionCall>,
        deadline: Duration,
    ) -> Result<RpcTxReceipt, GatewayError> {
        let tx_hash = self
            .wallet
            .send_batch(calls)
            .await
            .map_err(|e| rpc_err(what, e))?;
        debug!(%what, %tx_hash, "rollup tx sent");
        self.wait_for_inclusion(what, tx_hash, deadline).await
    }

    /// Polls the node for `tx_hash` until it is mined, reverted or dropped.
    async fn wait_for_inclusion(
        &self,
        what: &'static str,
        tx_hash: B256,
        deadline: Duration,
    ) -> Result<RpcTxReceipt, GatewayError> {
        let poll = async {
            loop {
                match self.node.get_tx_receipt(tx_hash).await {
                    Ok(receipt) => match receipt.status {
                        RpcTxStatus::Success => return Ok(receipt),
                        RpcTxStatus::Pending => trace!(%what, %tx_hash, "tx pending"),
                        RpcTxStatus::Reverted | RpcTxStatus::Dropped => {
                            let reason =
                                receipt.error.as_deref().unwrap_or("transaction dropped");
                            warn!(%what, %tx_hash, %reason, "rollup tx failed");
                            return Err(classify_revert(reason));
                        }
                    },
                    Err(e) => {
                        let err = rpc_err("getTxReceipt", e);
                        if !err.is_transient() {
                            return Err(err);
                        }
                        warn!(%what, %tx_hash, %err, "receipt poll failed, retrying");
                    }
                }
                sleep(self.timings.poll_interval).await;
            }
        };

        timeout(deadline, poll)
            .await
            .map_err(|_| GatewayError::TimeoutExceeded(deadline))?
    }
}

#[async_trait]
impl RollupGateway for RpcRollupGateway {
    async fn generate_claim_secret(&self) -> Result<ClaimSecret, GatewayError> {
        let secret = FieldElement::random_secret();
        let secret_hash = self
            .wallet
            .compute_secret_hash(secret)
            .await
            .map_err(|e| rpc_err("computeSecretHash", e))?;
        Ok(ClaimSecret::new(secret, secret_hash))
    }

    async fn claim_deposit(
        &self,
        recipient: RollupAddress,
        amount: Amount,
        claim: &DepositClaim,
    ) -> Result<(), GatewayError> {
        let call = FunctionCall::new(
            self.addresses.token_bridge,
            "claim_public",
            vec![
                json!(recipient),
                json!(amount),
                json!(claim.claim_secret()),
                json!(claim.message_leaf_index()),
            ],
        );
        let receipt = self
            .send_and_wait("claim_public", vec![call], self.timings.claim_timeout)
            .await?;
        info!(%recipient, %amount, tx = %receipt.tx_hash, "deposit claimed on rollup");
        Ok(())
    }

    fn authorize_burn(
        &self,
        owner: RollupAddress,
        amount: Amount,
        nonce: FieldElement,
    ) -> WithdrawalAuthorization {
        WithdrawalAuthorization::new(
            self.addresses.token_bridge,
            BurnAction {
                owner,
                amount,
                nonce,
            },
        )
    }

    async fn submit_authorization(
        &self,
        auth: WithdrawalAuthorization,
    ) -> Result<(), GatewayError> {
        let intent = auth_wit_intent(self.addresses.token, &auth);
        let tx_hash = self
            .wallet
            .set_public_auth_wit(intent, true)
            .await
            .map_err(|e| rpc_err("setPublicAuthWit", e))?;
        self.wait_for_inclusion("setPublicAuthWit", tx_hash, self.timings.inclusion_timeout)
            .await?;
        let burn = auth.action();
        debug!(
            caller = %auth.caller(),
            owner = %burn.owner,
            nonce = %burn.nonce,
            "burn authorization published"
        );
        Ok(())
    }

    async fn initiate_exit(
        &self,
        recipient: BaseAddress,
        amount: Amount,
        nonce: FieldElement,
    ) -> Result<ExitReceipt, GatewayError> {
        let call = FunctionCall::new(
            self.addresses.token_bridge,
            "exit_to_l1_public",
            vec![
                json!(recipient),
                json!(amount),
                json!(BaseAddress::ZERO),
                json!(nonce),
            ],
        );
        let receipt = self
            .send_and_wait("exit_to_l1_public", vec![call], self.timings.inclusion_timeout)
            .await?;
        let block_number = receipt
            .block_number
            .ok_or_else(|| GatewayError::invalid_response("exit receipt has no block number"))?;

        info!(%recipient, %amount, block_number, tx = %receipt.tx_hash, "exit submitted");
        Ok(ExitReceipt {
            block_number,
            tx_hash: receipt.tx_hash,
        })
    }

    async fn read_balance(&self, address: RollupAddress) -> Result<Amount, GatewayError> {
        let call = FunctionCall::new(
            self.addresses.token,
            "balance_of_public",
            vec![json!(address)],
        );
        let values = self
            .wallet
            .simulate(call)
            .await
            .map_err(|e| rpc_err("balance_of_public", e))?;
        let value = values
            .first()
            .ok_or_else(|| GatewayError::invalid_response("balance_of_public returned nothing"))?;
        Ok(Amount::new(value.to_u256()))
    }

    async fn is_message_synced(&self, message_hash: FieldElement) -> Result<bool, GatewayError> {
        self.node
            .is_l1_to_l2_message_synced(message_hash)
            .await
            .map_err(|e| rpc_err("isL1ToL2MessageSynced", e))
    }

    fn bridge_address(&self) -> RollupAddress {
        self.addresses.token_bridge
    }
}
