//! Gist attestation processor.
//!
//! A run reads the checkpoint of its network, fetches the `GistSubmitted` events of the blocks
//! added since, verifies the claim each one points to and writes an attestation for every
//! verified claim, then advances the checkpoint to the chain head.
pub mod cfg;
pub mod errors;
pub mod processor;

pub use errors::{ConfigError, ErrorKind, EventFailure, RunError};
pub use processor::{BlockRange, EventOutcome, EventStatus, Processor, RunReport};

use cfg::{NetworkConfig, ProcessorConfig};
use gist_attest_checkpoint::CheckpointStore;
use gist_attest_claim::{ClaimValidator, GithubConfig, GithubGistClient, SystemClock};
use gist_attest_events::{BasescanClient, LogQueryConfig, RetryPolicy, DEFAULT_HTTP_TIMEOUT};
use gist_attest_writer::{ChainHead, RegistryWriter, RpcChainHead, WriterConfig};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` takes precedence over `verbosity`.
pub fn init_tracing_subscriber(verbosity: u8) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

/// Refuse to run against a node of another chain than `network`.
pub async fn verify_chain_id<H: ChainHead>(
    chain_head: &H,
    network: &NetworkConfig,
) -> Result<(), RunError> {
    let actual = chain_head.chain_id().await?;
    if actual != network.chain_id {
        return Err(ConfigError::ChainIdMismatch {
            network: network.name,
            expected: network.chain_id,
            actual,
        }
        .into());
    }
    Ok(())
}

/// Build the production components from `config` and run a single pass.
pub async fn run(config: ProcessorConfig) -> Result<RunReport, RunError> {
    info!(
        target: "processor",
        network = config.network.name,
        chain_id = config.network.chain_id,
        signer = %config.signer.address(),
        "starting pass"
    );

    let checkpoints =
        CheckpointStore::new(config.state_dir.clone(), NetworkConfig::starting_blocks());
    let chain_head =
        RpcChainHead::new(config.rpc_url.clone(), gist_attest_writer::DEFAULT_HTTP_TIMEOUT)?;
    verify_chain_id(&chain_head, &config.network).await?;
    let events = BasescanClient::new(
        LogQueryConfig {
            api_url: config.log_api_url.clone(),
            api_key: config.basescan_api_key.clone(),
            contract_address: config.gist_submission_address,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        },
        RetryPolicy::default(),
    )?;
    let gists = GithubGistClient::new(GithubConfig {
        api_url: config.github_api_url.clone(),
        token: config.github_token.clone(),
        http_timeout: gist_attest_claim::gist::DEFAULT_HTTP_TIMEOUT,
    })
    .map_err(|e| RunError::HttpClient(e.to_string()))?;
    let writer = RegistryWriter::new(WriterConfig::new(
        config.rpc_url.clone(),
        config.attestation_registry_address,
    ))
    .map_err(|e| RunError::HttpClient(e.to_string()))?;

    Processor::new(
        config.network.name,
        checkpoints,
        chain_head,
        events,
        ClaimValidator::new(gists, SystemClock),
        writer,
        config.signer,
    )
    .run_once()
    .await
}
