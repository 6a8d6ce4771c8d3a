//! Errors of a processor run and their classification.
use gist_attest_checkpoint::CheckpointError;
use gist_attest_claim::{ClaimRejection, RejectionReason};
use gist_attest_events::{EventSourceError, UndecodableLog};
use gist_attest_writer::{ChainHeadError, WriteError};

/// What the batch boundary does with an error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ErrorKind {
    /// the run stops, the checkpoint is not advanced
    #[error("Fatal {0}")]
    Fatal(String),
    /// the event is tallied as failed, the batch goes on
    #[error("Skip {0}")]
    Skip(String),
}

impl ErrorKind {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::Fatal(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration {0}")]
    Missing(&'static str),
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("unknown network {0:?}, expected sepolia or mainnet")]
    UnknownNetwork(String),
    /// neither the environment nor the deployment file names the submission contract
    #[error("no GistSubmission contract address for network {0}")]
    SubmissionContractNotConfigured(String),
    /// RPC_URL points at a node of another chain
    #[error("rpc node of network {network} reports chain id {actual}, expected {expected}")]
    ChainIdMismatch {
        network: &'static str,
        expected: u64,
        actual: u64,
    },
}

/// A condition that aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot build http client: {0}")]
    HttpClient(String),
    #[error(transparent)]
    ChainHead(#[from] ChainHeadError),
    #[error(transparent)]
    Source(#[from] EventSourceError),
    #[error("checkpoint persistence failed: {0}")]
    State(#[from] CheckpointError),
}

impl From<&RunError> for ErrorKind {
    fn from(e: &RunError) -> Self {
        ErrorKind::Fatal(e.to_string())
    }
}

/// Why a single event did not produce an attestation.
#[derive(Debug, thiserror::Error)]
pub enum EventFailure {
    #[error("validation rejected: {0}")]
    Rejected(#[from] ClaimRejection),
    #[error("attestation write failed: {0}")]
    WriteFailed(#[from] WriteError),
}

impl EventFailure {
    /// Short code for reports, the rejection reason or `WriteFailed`.
    pub fn code(&self) -> &'static str {
        match self {
            EventFailure::Rejected(r) => r.reason.code(),
            EventFailure::WriteFailed(_) => "WriteFailed",
        }
    }

    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self {
            EventFailure::Rejected(r) => Some(r.reason),
            EventFailure::WriteFailed(_) => None,
        }
    }
}

impl From<&EventFailure> for ErrorKind {
    fn from(e: &EventFailure) -> Self {
        ErrorKind::Skip(e.to_string())
    }
}

impl From<&UndecodableLog> for ErrorKind {
    fn from(e: &UndecodableLog) -> Self {
        ErrorKind::Skip(e.to_string())
    }
}
