//! Errors of the event source.
//!
//! A [FetchFailure] describes one failed attempt and is always retried. Only the
//! [EventSourceError] returned once the retry budget is spent reaches the caller, so
//! "no events in range" and "range could not be queried" never look alike.

/// Why a single query attempt failed.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FetchFailure {
    /// request could not be sent or the body could not be read
    #[error("transport error: {0}")]
    Transport(String),
    /// upstream answered with a non-2xx status
    #[error("unexpected http status {0}")]
    HttpStatus(u16),
    /// upstream asked us to slow down
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// upstream answered with an error status flag
    #[error("upstream error: {0}")]
    Upstream(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EventSourceError {
    /// every attempt failed; the range must be queried again later
    #[error("log source unavailable after {attempts} attempts: {last_error}")]
    SourceUnavailable {
        attempts: u32,
        last_error: FetchFailure,
    },
    /// the submission contract address is the zero address
    #[error("submission contract address is not configured")]
    ContractNotConfigured,
    /// the http client could not be created
    #[error("cannot build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// A log of the queried range that could not be turned into a submission event. It is
/// skipped; the other logs of the range are still returned.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("cannot decode log {tx_hash} in block {block}: {reason}")]
pub struct UndecodableLog {
    pub tx_hash: String,
    pub block: String,
    pub reason: String,
}
