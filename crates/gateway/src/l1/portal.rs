use std::fmt;

use alloy::{
    contract::Error as ContractError,
    network::EthereumWallet,
    primitives::{Address, B256, U256},
    providers::{DynProvider, PendingTransactionError, Provider, ProviderBuilder},
    rpc::types::TransactionReceipt,
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use tokenbridge_config::L1Addresses;
use tokenbridge_primitives::{
    Amount, BaseAddress, ClaimSecret, DepositClaim, FieldElement, MembershipWitness,
    RollupAddress, WithdrawalMessage,
};
use tracing::*;

#[cfg(feature = "faucet")]
use super::contracts::IFeeAssetHandler;
use super::contracts::{IOutbox, ITokenPortal, IERC20};
#[cfg(feature = "faucet")]
use crate::{traits::FaucetGateway, types::TxReceipt};
use crate::{traits::PortalGateway, GatewayError};

/// [`PortalGateway`] talking to the portal, token and outbox contracts over HTTP.
pub struct AlloyPortalGateway {
    provider: DynProvider,
    signer_address: Address,
    addresses: L1Addresses,
    outbox: Address,
    l1_chain_id: u64,
    rollup_version: u64,
}

impl fmt::Debug for AlloyPortalGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlloyPortalGateway")
            .field("signer_address", &self.signer_address)
            .field("addresses", &self.addresses)
            .field("outbox", &self.outbox)
            .field("l1_chain_id", &self.l1_chain_id)
            .field("rollup_version", &self.rollup_version)
            .finish_non_exhaustive()
    }
}

impl AlloyPortalGateway {
    /// Connects to the base chain and reads its chain id.
    ///
    /// `outbox` and `rollup_version` come from the rollup node, which knows
    /// which L1 deployment it settles to.
    pub async fn connect(
        rpc_url: &str,
        signer: PrivateKeySigner,
        addresses: L1Addresses,
        outbox: Address,
        rollup_version: u64,
    ) -> Result<Self, GatewayError> {
        let signer_address = signer.address();
        let url = rpc_url
            .parse()
            .map_err(|e| GatewayError::rpc(format!("invalid L1 rpc url {rpc_url}: {e}")))?;
        let provider = DynProvider::new(
            ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(url),
        );

        let l1_chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| GatewayError::rpc(format!("get chain id: {e}")))?;

        debug!(%signer_address, l1_chain_id, portal = %addresses.portal, "connected to base chain");

        Ok(Self {
            provider,
            signer_address,
            addresses,
            outbox,
            l1_chain_id,
            rollup_version,
        })
    }

    pub fn signer_address(&self) -> Address {
        self.signer_address
    }

    pub fn l1_chain_id(&self) -> u64 {
        self.l1_chain_id
    }
}

/// Maps a failed contract call; node-side error responses mean the call was rejected.
fn contract_err(action: &str, err: ContractError) -> GatewayError {
    if let ContractError::TransportError(e) = &err {
        return match e.as_error_resp() {
            Some(payload) => {
                GatewayError::TransactionRejected(format!("{action}: {}", payload.message))
            }
            None => GatewayError::rpc(format!("{action}: {e}")),
        };
    }
    GatewayError::invalid_response(format!("{action}: {err}"))
}

fn read_err(action: &str, err: ContractError) -> GatewayError {
    GatewayError::rpc(format!("{action}: {err}"))
}

fn pending_err(action: &str, err: PendingTransactionError) -> GatewayError {
    GatewayError::rpc(format!("{action}: waiting for receipt: {err}"))
}

fn ensure_success(action: &str, receipt: &TransactionReceipt) -> Result<(), GatewayError> {
    if !receipt.status() {
        return Err(GatewayError::TransactionRejected(format!(
            "{action} reverted in tx {}",
            receipt.transaction_hash
        )));
    }
    Ok(())
}

/// Pulls `(key, index)` out of the portal's deposit event.
fn deposit_event(receipt: &TransactionReceipt, private: bool) -> Option<(B256, U256)> {
    receipt.inner.logs().iter().find_map(|log| {
        if private {
            log.log_decode::<ITokenPortal::DepositToAztecPrivate>()
                .ok()
                .map(|event| (event.inner.key, event.inner.index))
        } else {
            log.log_decode::<ITokenPortal::DepositToAztecPublic>()
                .ok()
                .map(|event| (event.inner.key, event.inner.index))
        }
    })
}

#[async_trait]
impl PortalGateway for AlloyPortalGateway {
    async fn initiate_deposit(
        &self,
        recipient: RollupAddress,
        amount: Amount,
        private: bool,
        secret: ClaimSecret,
    ) -> Result<DepositClaim, GatewayError> {
        let available = self.read_balance(self.signer_address).await?;
        if available < amount {
            return Err(GatewayError::InsufficientFunds {
                available,
                required: amount,
            });
        }

        let secret_hash = B256::from(*secret.secret_hash());

        let token = IERC20::new(self.addresses.token, &self.provider);
        let receipt = token
            .approve(self.addresses.portal, amount.into_inner())
            .send()
            .await
            .map_err(|e| contract_err("approve", e))?
            .get_receipt()
            .await
            .map_err(|e| pending_err("approve", e))?;
        ensure_success("approve", &receipt)?;
        trace!(tx = %receipt.transaction_hash, "portal approved");

        let portal = ITokenPortal::new(self.addresses.portal, &self.provider);
        let receipt = if private {
            portal
                .depositToAztecPrivate(amount.into_inner(), secret_hash)
                .send()
                .await
                .map_err(|e| contract_err("deposit", e))?
                .get_receipt()
                .await
                .map_err(|e| pending_err("deposit", e))?
        } else {
            portal
                .depositToAztecPublic(
                    B256::from(FieldElement::from(recipient)),
                    amount.into_inner(),
                    secret_hash,
                )
                .send()
                .await
                .map_err(|e| contract_err("deposit", e))?
                .get_receipt()
                .await
                .map_err(|e| pending_err("deposit", e))?
        };
        ensure_success("deposit", &receipt)?;

        let (key, index) = deposit_event(&receipt, private)
            .ok_or_else(|| GatewayError::invalid_response("deposit event missing from receipt"))?;
        let message_hash = FieldElement::new(key).map_err(|_| {
            GatewayError::invalid_response(format!("message hash {key} out of field"))
        })?;
        let leaf_index: u64 = index
            .try_into()
            .map_err(|_| GatewayError::invalid_response(format!("leaf index {index} too large")))?;

        info!(
            %recipient,
            %amount,
            %message_hash,
            leaf_index,
            tx = %receipt.transaction_hash,
            "deposit escrowed in portal"
        );

        Ok(DepositClaim::new(secret, message_hash, leaf_index))
    }

    async fn finalize_withdrawal(
        &self,
        amount: Amount,
        recipient: BaseAddress,
        block_number: u64,
        witness: MembershipWitness,
    ) -> Result<(), GatewayError> {
        let outbox = IOutbox::new(self.outbox, &self.provider);
        let consumed = outbox
            .hasMessageBeenConsumedAtBlockAndIndex(
                U256::from(block_number),
                U256::from(witness.leaf_index()),
            )
            .call()
            .await
            .map_err(|e| read_err("outbox lookup", e))?;
        if consumed {
            return Err(GatewayError::MessageAlreadyClaimed);
        }

        let portal = ITokenPortal::new(self.addresses.portal, &self.provider);
        let receipt = portal
            .withdraw(
                recipient,
                amount.into_inner(),
                false,
                U256::from(block_number),
                U256::from(witness.leaf_index()),
                witness.sibling_path().to_vec(),
            )
            .send()
            .await
            .map_err(|e| match contract_err("withdraw", e) {
                // A revert at this point can only be the outbox rejecting the proof.
                GatewayError::TransactionRejected(reason) => GatewayError::ProofInvalid(reason),
                other => other,
            })?
            .get_receipt()
            .await
            .map_err(|e| pending_err("withdraw", e))?;

        if !receipt.status() {
            return Err(GatewayError::ProofInvalid(format!(
                "withdraw reverted in tx {}",
                receipt.transaction_hash
            )));
        }

        info!(
            %recipient,
            %amount,
            block_number,
            tx = %receipt.transaction_hash,
            "withdrawal finalized"
        );
        Ok(())
    }

    async fn read_balance(&self, address: BaseAddress) -> Result<Amount, GatewayError> {
        let token = IERC20::new(self.addresses.token, &self.provider);
        let balance = token
            .balanceOf(address)
            .call()
            .await
            .map_err(|e| read_err("balanceOf", e))?;
        Ok(Amount::new(balance))
    }

    async fn withdrawal_message(
        &self,
        amount: Amount,
        recipient: BaseAddress,
        l2_bridge: RollupAddress,
        caller_on_l1: BaseAddress,
    ) -> Result<WithdrawalMessage, GatewayError> {
        Ok(WithdrawalMessage {
            l2_bridge,
            rollup_version: self.rollup_version,
            portal: self.addresses.portal,
            l1_chain_id: self.l1_chain_id,
            recipient,
            amount,
            caller_on_l1,
        })
    }
}

#[cfg(feature = "faucet")]
#[async_trait]
impl FaucetGateway for AlloyPortalGateway {
    async fn mint_amount(&self) -> Result<Amount, GatewayError> {
        let handler = IFeeAssetHandler::new(self.addresses.fee_asset_handler, &self.provider);
        let amount = handler
            .mintAmount()
            .call()
            .await
            .map_err(|e| read_err("mintAmount", e))?;
        Ok(Amount::new(amount))
    }

    async fn mint(&self, to: BaseAddress) -> Result<TxReceipt, GatewayError> {
        let handler = IFeeAssetHandler::new(self.addresses.fee_asset_handler, &self.provider);
        let receipt = handler
            .mint(to)
            .send()
            .await
            .map_err(|e| contract_err("mint", e))?
            .get_receipt()
            .await
            .map_err(|e| pending_err("mint", e))?;
        ensure_success("mint", &receipt)?;

        info!(%to, tx = %receipt.transaction_hash, "minted test tokens");
        Ok(TxReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }
}
