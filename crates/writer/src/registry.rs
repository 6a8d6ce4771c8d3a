//! Writes attestations to the registry contract.
use crate::errors::{ensure_configured, WriteError};
use crate::rpc::{http_client, rpc_client, DEFAULT_HTTP_TIMEOUT};
use crate::AttestationSink;
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, B256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::SolCall;
use alloy_transport_http::reqwest;
use async_trait::async_trait;
use gist_attest_bindings::IAttestationRegistry::createAttestationCall;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_GAS_LIMIT: u64 = 200_000;
/// 20 gwei
pub const DEFAULT_GAS_PRICE: u128 = 20_000_000_000;
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Gas is fixed rather than estimated.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub rpc_url: Url,
    pub registry_address: Address,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub confirmation_timeout: Duration,
    /// bound of each json-rpc request, confirmation polling included
    pub http_timeout: Duration,
}

impl WriterConfig {
    pub fn new(rpc_url: Url, registry_address: Address) -> Self {
        Self {
            rpc_url,
            registry_address,
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    Success,
    Reverted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttestationOutcome {
    pub tx_hash: B256,
    pub confirmed: bool,
    pub block_status: BlockStatus,
    pub block_number: Option<u64>,
}

impl AttestationOutcome {
    pub fn is_success(&self) -> bool {
        self.confirmed && self.block_status == BlockStatus::Success
    }

    /// Turn a reverted outcome into [WriteError::Reverted].
    pub fn into_result(self) -> Result<Self, WriteError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(WriteError::Reverted {
                tx_hash: self.tx_hash,
                block_number: self.block_number,
            })
        }
    }
}

/// Legacy priced call of `createAttestation(address,string,string)` on the registry.
pub fn attestation_request(
    config: &WriterConfig,
    address: Address,
    username: &str,
    gist_url: &str,
) -> TransactionRequest {
    let call = createAttestationCall {
        ethAddress: address,
        githubUsername: username.to_string(),
        gistUrl: gist_url.to_string(),
    };
    TransactionRequest::default()
        .with_to(config.registry_address)
        .with_input(call.abi_encode())
        .with_gas_limit(config.gas_limit)
        .with_gas_price(config.gas_price)
}

#[derive(Debug, Clone)]
pub struct RegistryWriter {
    config: WriterConfig,
    /// shared by the per-call providers, carries the request timeout
    inner: reqwest::Client,
}

impl RegistryWriter {
    pub fn new(config: WriterConfig) -> Result<Self, WriteError> {
        let inner = http_client(config.http_timeout).map_err(WriteError::HttpClient)?;
        Ok(Self { config, inner })
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }
}

#[async_trait]
impl AttestationSink for RegistryWriter {
    async fn create_attestation(
        &self,
        signer: &PrivateKeySigner,
        address: Address,
        username: &str,
        gist_url: &str,
    ) -> Result<AttestationOutcome, WriteError> {
        ensure_configured(self.config.registry_address)?;

        // a provider per call, its block poller stops once the provider is dropped
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_client(rpc_client(self.inner.clone(), self.config.rpc_url.clone()));
        let request = attestation_request(&self.config, address, username, gist_url);

        let pending = provider.send_transaction(request).await?;
        let tx_hash = *pending.tx_hash();
        info!(
            target: "attestation_writer",
            %tx_hash,
            %address,
            username,
            "attestation transaction sent"
        );

        let timeout = self.config.confirmation_timeout;
        let receipt = pending
            .with_timeout(Some(timeout))
            .get_receipt()
            .await
            .map_err(|e| WriteError::from_pending(tx_hash, timeout, e))?;

        let block_status = if receipt.status() {
            BlockStatus::Success
        } else {
            warn!(target: "attestation_writer", %tx_hash, "attestation transaction reverted");
            BlockStatus::Reverted
        };
        Ok(AttestationOutcome {
            tx_hash,
            confirmed: true,
            block_status,
            block_number: receipt.block_number,
        })
    }
}
