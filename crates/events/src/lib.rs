//! Source of `GistSubmitted` events.
//!
//! - [EventSource]: trait consumed by the processor
//! - [BasescanClient]: implementation over an etherscan-style log-query API
pub mod basescan;
pub use basescan::{BasescanClient, LogQueryConfig, DEFAULT_HTTP_TIMEOUT};

pub mod errors;
pub use errors::{EventSourceError, FetchFailure, UndecodableLog};

pub mod event;
pub use event::SubmissionEvent;

pub mod retry;
pub use retry::RetryPolicy;

pub mod status_code;

use async_trait::async_trait;

/// Answer for one block range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedEvents {
    /// ordered by block number then log index
    pub events: Vec<SubmissionEvent>,
    pub undecodable: Vec<UndecodableLog>,
}

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch the `GistSubmitted` events of the inclusive block range, ordered by block number
    /// then log index.
    ///
    /// An empty answer means the range was queried and holds no events. A range that could
    /// not be queried is reported as [EventSourceError::SourceUnavailable]. Logs that cannot
    /// be decoded do not fail the range, they are listed in [FetchedEvents::undecodable].
    async fn fetch_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<FetchedEvents, EventSourceError>;
}
