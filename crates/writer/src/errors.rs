use alloy_primitives::{Address, B256};
use alloy_provider::{PendingTransactionError, WatchTxError};
use alloy_transport::TransportError;
use alloy_transport_http::reqwest;
use std::time::Duration;

/// Failure to record an attestation on chain. None of them is retried by the writer.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// the registry address is the zero sentinel, nothing was sent
    #[error("attestation registry address is not configured")]
    RegistryNotConfigured,
    #[error("cannot build rpc http client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("rpc transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("transaction {tx_hash} was not confirmed within {timeout:?}")]
    ConfirmationTimeout { tx_hash: B256, timeout: Duration },
    #[error("transaction {tx_hash} reverted in block {block_number:?}")]
    Reverted {
        tx_hash: B256,
        block_number: Option<u64>,
    },
    #[error("transaction {tx_hash} could not be watched: {source}")]
    Watch {
        tx_hash: B256,
        #[source]
        source: PendingTransactionError,
    },
}

impl WriteError {
    pub(crate) fn from_pending(
        tx_hash: B256,
        timeout: Duration,
        error: PendingTransactionError,
    ) -> Self {
        match error {
            PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
                Self::ConfirmationTimeout { tx_hash, timeout }
            }
            PendingTransactionError::TransportError(e) => Self::Transport(e),
            source => Self::Watch { tx_hash, source },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChainHeadError {
    #[error("cannot build rpc http client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("rpc call to {rpc} failed: {source}")]
    Transport {
        rpc: String,
        #[source]
        source: TransportError,
    },
}

/// Guard shared by everything that writes to the registry.
pub(crate) fn ensure_configured(registry: Address) -> Result<(), WriteError> {
    if registry.is_zero() {
        return Err(WriteError::RegistryNotConfigured);
    }
    Ok(())
}
