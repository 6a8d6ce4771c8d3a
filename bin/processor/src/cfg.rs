//! Configuration of a processor run.
//!
//! [ProcessorArgs] is what clap reads from the command line and the environment; every field is
//! optional there. [ProcessorArgs::into_config] turns it into a [ProcessorConfig] or reports the
//! first missing or invalid option, before any I/O against the chain or the gist host.
use crate::errors::ConfigError;
use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use clap::{ArgAction, Parser};
use gist_attest_claim::DEFAULT_GITHUB_API_URL;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;

/// Chain specific constants of a supported network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: &'static str,
    pub chain_id: u64,
    /// checkpoint of a network that was never processed
    pub starting_block: u64,
    pub log_api_url: &'static str,
}

pub const BASE_SEPOLIA: NetworkConfig = NetworkConfig {
    name: "sepolia",
    chain_id: 84532,
    starting_block: 7_000_000,
    log_api_url: "https://api-sepolia.basescan.org/api",
};

pub const BASE_MAINNET: NetworkConfig = NetworkConfig {
    name: "mainnet",
    chain_id: 8453,
    starting_block: 10_000_000,
    log_api_url: "https://api.basescan.org/api",
};

pub const NETWORKS: [NetworkConfig; 2] = [BASE_SEPOLIA, BASE_MAINNET];

impl NetworkConfig {
    pub fn by_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "sepolia" => Ok(BASE_SEPOLIA),
            "mainnet" => Ok(BASE_MAINNET),
            _ => Err(ConfigError::UnknownNetwork(name.to_string())),
        }
    }

    /// Starting block of every supported network, keyed by name.
    pub fn starting_blocks() -> HashMap<String, u64> {
        NETWORKS
            .iter()
            .map(|n| (n.name.to_string(), n.starting_block))
            .collect()
    }
}

/// Contract addresses of a network as recorded by the deployment tooling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deployment {
    pub gist_submission: Address,
    pub attestation_registry: Address,
}

#[derive(Deserialize)]
struct DeploymentFile {
    #[serde(default)]
    contracts: DeploymentContracts,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DeploymentContracts {
    gist_submission: Option<Address>,
    attestation_registry: Option<Address>,
}

impl Deployment {
    pub fn path(deployments_dir: &Path, network: &str) -> PathBuf {
        deployments_dir.join(format!("{network}.json"))
    }

    /// Read `<deployments_dir>/<network>.json`. Contracts that are not recorded, or a file that
    /// cannot be read, yield the zero address.
    pub fn load(deployments_dir: &Path, network: &str) -> Self {
        let path = Self::path(deployments_dir, network);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                info!(target: "processor", path = %path.display(), "no deployment file: {e}");
                return Self::default();
            }
        };
        match serde_json::from_str::<DeploymentFile>(&raw) {
            Ok(file) => Self {
                gist_submission: file.contracts.gist_submission.unwrap_or_default(),
                attestation_registry: file.contracts.attestation_registry.unwrap_or_default(),
            },
            Err(e) => {
                warn!(target: "processor", path = %path.display(), "unreadable deployment file: {e}");
                Self::default()
            }
        }
    }
}

/// Ingest gist submissions and write verified attestations on chain.
#[derive(Clone, Parser)]
#[command(name = "gist-attest-processor", version)]
pub struct ProcessorArgs {
    /// Network to process, `sepolia` or `mainnet`
    #[arg(long, env = "NETWORK", default_value = "sepolia")]
    pub network: String,

    /// Json-rpc endpoint of the chain
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Hex private key signing the attestation transactions
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Key of the log-query API
    #[arg(long, env = "BASESCAN_API_KEY", hide_env_values = true)]
    pub basescan_api_key: Option<String>,

    /// Token for the github API, public gists only without it
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Directory of the checkpoint files
    #[arg(long, env = "STATE_DIR", default_value = "state")]
    pub state_dir: PathBuf,

    /// Directory of the `<network>.json` deployment files
    #[arg(long, env = "DEPLOYMENTS_DIR", default_value = "deployments")]
    pub deployments_dir: PathBuf,

    /// Overrides the GistSubmission address of the deployment file
    #[arg(long, env = "GIST_SUBMISSION_ADDRESS")]
    pub gist_submission_address: Option<String>,

    /// Overrides the AttestationRegistry address of the deployment file
    #[arg(long, env = "ATTESTATION_REGISTRY_ADDRESS")]
    pub attestation_registry_address: Option<String>,

    /// Overrides the log-query endpoint of the network
    #[arg(long, env = "LOG_API_URL")]
    pub log_api_url: Option<String>,

    /// Overrides the github API endpoint
    #[arg(long, env = "GITHUB_API_URL")]
    pub github_api_url: Option<String>,

    /// Verbosity, repeat for more
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Validated configuration of a run.
#[derive(Clone)]
pub struct ProcessorConfig {
    pub network: NetworkConfig,
    pub rpc_url: Url,
    pub signer: PrivateKeySigner,
    pub basescan_api_key: String,
    pub github_token: Option<String>,
    pub state_dir: PathBuf,
    pub gist_submission_address: Address,
    pub attestation_registry_address: Address,
    pub log_api_url: Url,
    pub github_api_url: Url,
}

// secrets stay out of logs
impl fmt::Debug for ProcessorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorConfig")
            .field("network", &self.network.name)
            .field("rpc_url", &self.rpc_url.origin().ascii_serialization())
            .field("signer", &self.signer.address())
            .field("github_token", &self.github_token.as_ref().map(|_| "<set>"))
            .field("state_dir", &self.state_dir)
            .field("gist_submission_address", &self.gist_submission_address)
            .field(
                "attestation_registry_address",
                &self.attestation_registry_address,
            )
            .field("log_api_url", &self.log_api_url.as_str())
            .field("github_api_url", &self.github_api_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ProcessorArgs {
    pub fn into_config(self) -> Result<ProcessorConfig, ConfigError> {
        let network = NetworkConfig::by_name(&self.network)?;

        let rpc_url = parse_url("RPC_URL", &required("RPC_URL", self.rpc_url)?)?;
        let signer = required("PRIVATE_KEY", self.private_key)?
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|e| ConfigError::Invalid {
                name: "PRIVATE_KEY",
                reason: e.to_string(),
            })?;
        let basescan_api_key = required("BASESCAN_API_KEY", self.basescan_api_key)?;
        let github_token = self.github_token.filter(|t| !t.trim().is_empty());

        let deployment = Deployment::load(&self.deployments_dir, network.name);
        let gist_submission_address = match self.gist_submission_address {
            Some(raw) => parse_address("GIST_SUBMISSION_ADDRESS", &raw)?,
            None => deployment.gist_submission,
        };
        if gist_submission_address.is_zero() {
            return Err(ConfigError::SubmissionContractNotConfigured(
                network.name.to_string(),
            ));
        }
        let attestation_registry_address = match self.attestation_registry_address {
            Some(raw) => parse_address("ATTESTATION_REGISTRY_ADDRESS", &raw)?,
            None => deployment.attestation_registry,
        };
        if attestation_registry_address.is_zero() {
            warn!(
                target: "processor",
                network = network.name,
                "attestation registry is not configured, no attestation will be written"
            );
        }

        let log_api_url = parse_url(
            "LOG_API_URL",
            self.log_api_url.as_deref().unwrap_or(network.log_api_url),
        )?;
        let github_api_url = parse_url(
            "GITHUB_API_URL",
            self.github_api_url
                .as_deref()
                .unwrap_or(DEFAULT_GITHUB_API_URL),
        )?;

        Ok(ProcessorConfig {
            network,
            rpc_url,
            signer,
            basescan_api_key,
            github_token,
            state_dir: self.state_dir,
            gist_submission_address,
            attestation_registry_address,
            log_api_url,
            github_api_url,
        })
    }
}

fn required(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_address(name: &'static str, raw: &str) -> Result<Address, ConfigError> {
    raw.trim().parse().map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("{e}"),
    })
}
