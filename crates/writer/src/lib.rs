//! On-chain side of the attestation pipeline.
//!
//! - [AttestationSink]: records a verified binding, implemented by [RegistryWriter]
//! - [ChainHead]: latest block number, implemented by [RpcChainHead]
pub mod chain_head;
pub use chain_head::RpcChainHead;

pub mod errors;
pub use errors::{ChainHeadError, WriteError};

pub mod registry;
pub use registry::{
    attestation_request, AttestationOutcome, BlockStatus, RegistryWriter, WriterConfig,
    DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE,
};

pub mod rpc;
pub use rpc::DEFAULT_HTTP_TIMEOUT;

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

#[async_trait]
pub trait AttestationSink: Send + Sync {
    /// Record that `address` belongs to github user `username`, proven by `gist_url`.
    ///
    /// Blocks until the transaction is confirmed or the confirmation timeout elapses.
    async fn create_attestation(
        &self,
        signer: &PrivateKeySigner,
        address: Address,
        username: &str,
        gist_url: &str,
    ) -> Result<AttestationOutcome, WriteError>;
}

#[async_trait]
pub trait ChainHead: Send + Sync {
    async fn block_number(&self) -> Result<u64, ChainHeadError>;

    /// Chain id reported by the node.
    async fn chain_id(&self) -> Result<u64, ChainHeadError>;
}
