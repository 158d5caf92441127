//! A [`Ledger`] backed by a JSON-RPC node and a local private key

use std::{str::FromStr, time::Duration};

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::{http::reqwest::Url, RpcError, TransportError},
};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::decode_revert_reason;
use async_trait::async_trait;
use tracing::debug;

use crate::{
    constants::NUM_CONFIRMATIONS,
    errors::ScriptError,
    types::{Confirmation, DeployRequest, Deployed, RemoteCall},
};

use super::Ledger;

/// A ledger that signs locally and submits through an HTTP RPC node
pub struct RpcLedger {
    /// The provider, with wallet, nonce & gas fillers attached
    provider: DynProvider,
    /// The address of the local signer
    signer_address: Address,
    /// How long to wait for a submitted transaction to be confirmed
    confirmation_timeout: Duration,
}

impl RpcLedger {
    /// Sets up the client with which to submit transactions, checking that the
    /// node is reachable before returning
    pub async fn connect(
        priv_key: &str,
        rpc_url: &str,
        confirmation_timeout: Duration,
    ) -> Result<Self, ScriptError> {
        let signer = PrivateKeySigner::from_str(priv_key)
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        let signer_address = signer.address();

        let url =
            Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .on_http(url);
        let provider = DynProvider::new(provider);

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        debug!(chain_id, rpc_url, "connected to node");

        Ok(Self {
            provider,
            signer_address,
            confirmation_timeout,
        })
    }

    /// Submit a transaction and wait for a successful receipt
    async fn submit(&self, tx: TransactionRequest) -> Result<TransactionReceipt, ScriptError> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| classify_rpc_error(e, ScriptError::RemoteCallFailure))?;
        let tx_hash = *pending.tx_hash();
        debug!(tx_hash = %tx_hash, "transaction submitted");

        let receipt = tokio::time::timeout(
            self.confirmation_timeout,
            pending
                .with_required_confirmations(NUM_CONFIRMATIONS)
                .get_receipt(),
        )
        .await
        .map_err(|_| ScriptError::Timeout(format!("transaction {:#x}", tx_hash)))?
        .map_err(|e| ScriptError::RemoteCallFailure(e.to_string()))?;

        if !receipt.status() {
            return Err(ScriptError::Reverted(format!(
                "transaction {:#x} reverted",
                tx_hash
            )));
        }

        Ok(receipt)
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    fn signer_address(&self) -> Address {
        self.signer_address
    }

    async fn balance(&self, account: Address) -> Result<U256, ScriptError> {
        self.provider
            .get_balance(account)
            .await
            .map_err(|e| ScriptError::RemoteReadFailure(e.to_string()))
    }

    async fn has_code(&self, address: Address) -> Result<bool, ScriptError> {
        let code = self
            .provider
            .get_code_at(address)
            .await
            .map_err(|e| ScriptError::RemoteReadFailure(e.to_string()))?;
        Ok(!code.is_empty())
    }

    async fn deploy(&self, request: DeployRequest) -> Result<Deployed, ScriptError> {
        let tx = TransactionRequest::default().with_deploy_code(request.init_code);
        let receipt = self.submit(tx).await.map_err(|e| match e {
            ScriptError::InsufficientFunds { .. } => e,
            other => ScriptError::DeploymentFailure(format!("{}: {}", request.component, other)),
        })?;

        let address = receipt.contract_address.ok_or_else(|| {
            ScriptError::DeploymentFailure(format!(
                "{}: receipt {:#x} carries no contract address",
                request.component, receipt.transaction_hash
            ))
        })?;

        Ok(Deployed {
            address,
            confirmation: confirmation_of(&receipt),
        })
    }

    async fn send(&self, call: RemoteCall) -> Result<Confirmation, ScriptError> {
        let tx = TransactionRequest::default()
            .with_to(call.to)
            .with_input(call.input)
            .with_value(call.value);
        let receipt = self.submit(tx).await?;
        Ok(confirmation_of(&receipt))
    }

    async fn view(&self, to: Address, input: Bytes) -> Result<Bytes, ScriptError> {
        self.simulate(RemoteCall {
            to,
            input,
            value: U256::ZERO,
        })
        .await
    }

    async fn simulate(&self, call: RemoteCall) -> Result<Bytes, ScriptError> {
        let tx = TransactionRequest::default()
            .with_from(self.signer_address)
            .with_to(call.to)
            .with_input(call.input)
            .with_value(call.value);
        self.provider
            .call(&tx)
            .await
            .map_err(|e| classify_rpc_error(e, ScriptError::RemoteReadFailure))
    }
}

/// Extract the confirmation details from a receipt
fn confirmation_of(receipt: &TransactionReceipt) -> Confirmation {
    Confirmation {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
    }
}

/// Separate remote reverts from transport failures.
///
/// Nodes report reverts during gas estimation or `eth_call` as error responses
/// carrying the revert data; anything else is a transport-level failure and is
/// wrapped with `transport`.
fn classify_rpc_error(err: TransportError, transport: fn(String) -> ScriptError) -> ScriptError {
    match err {
        RpcError::ErrorResp(payload) => match payload.as_revert_data() {
            Some(data) => ScriptError::Reverted(
                decode_revert_reason(&data).unwrap_or_else(|| payload.message.to_string()),
            ),
            None if payload.message.contains("revert") => {
                ScriptError::Reverted(payload.message.to_string())
            }
            None => transport(payload.to_string()),
        },
        other => transport(other.to_string()),
    }
}
