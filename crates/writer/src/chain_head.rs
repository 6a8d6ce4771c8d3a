use crate::errors::ChainHeadError;
use crate::rpc::{http_client, rpc_client};
use crate::ChainHead;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_transport::TransportError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Reads the latest block number from a json-rpc node.
#[derive(Clone)]
pub struct RpcChainHead {
    rpc_url: Url,
    provider: DynProvider,
}

impl RpcChainHead {
    /// Every request to the node fails once `http_timeout` has elapsed.
    pub fn new(rpc_url: Url, http_timeout: Duration) -> Result<Self, ChainHeadError> {
        let inner = http_client(http_timeout).map_err(ChainHeadError::HttpClient)?;
        let provider = ProviderBuilder::new()
            .connect_client(rpc_client(inner, rpc_url.clone()))
            .erased();
        Ok(Self { rpc_url, provider })
    }

    fn transport_err(&self, source: TransportError) -> ChainHeadError {
        ChainHeadError::Transport {
            rpc: self.rpc_url.origin().ascii_serialization(),
            source,
        }
    }
}

#[async_trait]
impl ChainHead for RpcChainHead {
    async fn block_number(&self) -> Result<u64, ChainHeadError> {
        let head = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| self.transport_err(e))?;
        debug!(target: "attestation_writer", head, "queried chain head");
        Ok(head)
    }

    async fn chain_id(&self) -> Result<u64, ChainHeadError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| self.transport_err(e))
    }
}
