//! One ingestion pass over the blocks added since the last checkpoint.
use crate::errors::{ErrorKind, EventFailure, RunError};
use alloy_primitives::{Address, B256};
use alloy_signer_local::PrivateKeySigner;
use gist_attest_checkpoint::CheckpointStore;
use gist_attest_claim::{ClaimValidator, Clock, GistSource, RejectionReason};
use gist_attest_events::{EventSource, SubmissionEvent, UndecodableLog};
use gist_attest_writer::{AttestationOutcome, AttestationSink, ChainHead};
use tracing::{debug, error, info, warn};

/// Inclusive block range of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from_block: u64,
    pub to_block: u64,
}

impl BlockRange {
    pub fn is_empty(&self) -> bool {
        self.from_block > self.to_block
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStatus {
    Attested { attestation_tx: B256 },
    Rejected(RejectionReason),
    WriteFailed(String),
}

/// What happened to one submission event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    pub tx_hash: B256,
    pub block_number: u64,
    pub submitter: Address,
    pub gist_url: String,
    pub status: EventStatus,
}

impl EventOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, EventStatus::Attested { .. })
    }
}

/// Summary of a completed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub network: String,
    pub from_block: u64,
    pub to_block: u64,
    /// checkpoint persisted at the end of the pass
    pub checkpoint: u64,
    pub outcomes: Vec<EventOutcome>,
    /// logs of the range skipped because they could not be decoded
    pub undecodable: Vec<UndecodableLog>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Failed events, undecodable logs included.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded() + self.undecodable.len()
    }
}

/// States of a pass. Any fatal error leaves the machine through `Failed`, which is reported as
/// the returned [RunError].
#[derive(Debug)]
enum RunState {
    DeterminingRange,
    Fetching {
        range: BlockRange,
        head: u64,
        checkpoint: u64,
    },
    ProcessingBatch {
        range: BlockRange,
        head: u64,
        checkpoint: u64,
        events: Vec<SubmissionEvent>,
        undecodable: Vec<UndecodableLog>,
    },
    Advancing {
        range: BlockRange,
        head: u64,
        checkpoint: u64,
        outcomes: Vec<EventOutcome>,
        undecodable: Vec<UndecodableLog>,
    },
    Idle(RunReport),
}

impl RunState {
    fn name(&self) -> &'static str {
        match self {
            RunState::DeterminingRange => "DeterminingRange",
            RunState::Fetching { .. } => "Fetching",
            RunState::ProcessingBatch { .. } => "ProcessingBatch",
            RunState::Advancing { .. } => "Advancing",
            RunState::Idle(_) => "Idle",
        }
    }
}

/// Drives the components of a network through one pass, strictly in sequence.
pub struct Processor<H, E, G, C, W> {
    network: String,
    checkpoints: CheckpointStore,
    chain_head: H,
    events: E,
    validator: ClaimValidator<G, C>,
    writer: W,
    signer: PrivateKeySigner,
}

impl<H, E, G, C, W> Processor<H, E, G, C, W>
where
    H: ChainHead,
    E: EventSource,
    G: GistSource,
    C: Clock,
    W: AttestationSink,
{
    pub fn new(
        network: impl Into<String>,
        checkpoints: CheckpointStore,
        chain_head: H,
        events: E,
        validator: ClaimValidator<G, C>,
        writer: W,
        signer: PrivateKeySigner,
    ) -> Self {
        Self {
            network: network.into(),
            checkpoints,
            chain_head,
            events,
            validator,
            writer,
            signer,
        }
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    /// Process every block between the checkpoint and the chain head, then advance the
    /// checkpoint to the head.
    ///
    /// Events that fail validation or writing are reported and skipped; the checkpoint
    /// still moves past them, so they are not retried by a later pass.
    pub async fn run_once(&self) -> Result<RunReport, RunError> {
        let mut state = RunState::DeterminingRange;
        loop {
            debug!(target: "processor", network = %self.network, state = state.name(), "entering state");
            state = match self.step(state).await {
                Ok(RunState::Idle(report)) => return Ok(report),
                Ok(next) => next,
                Err(e) => {
                    error!(
                        target: "processor",
                        network = %self.network,
                        state = "Failed",
                        "{}",
                        ErrorKind::from(&e)
                    );
                    return Err(e);
                }
            };
        }
    }

    async fn step(&self, state: RunState) -> Result<RunState, RunError> {
        let next = match state {
            RunState::DeterminingRange => {
                let checkpoint = self.checkpoints.get(&self.network);
                let head = self.chain_head.block_number().await?;
                let range = BlockRange {
                    from_block: checkpoint.saturating_add(1),
                    to_block: head,
                };
                if range.is_empty() {
                    info!(target: "processor", checkpoint, head, "no new blocks");
                    RunState::Advancing {
                        range,
                        head,
                        checkpoint,
                        outcomes: Vec::new(),
                        undecodable: Vec::new(),
                    }
                } else {
                    RunState::Fetching {
                        range,
                        head,
                        checkpoint,
                    }
                }
            }
            RunState::Fetching {
                range,
                head,
                checkpoint,
            } => {
                let fetched = self
                    .events
                    .fetch_events(range.from_block, range.to_block)
                    .await?;
                for log in &fetched.undecodable {
                    warn!(
                        target: "processor",
                        tx_hash = %log.tx_hash,
                        block = %log.block,
                        reason = "Undecodable",
                        "{}",
                        ErrorKind::from(log)
                    );
                }
                info!(
                    target: "processor",
                    from_block = range.from_block,
                    to_block = range.to_block,
                    events = fetched.events.len(),
                    undecodable = fetched.undecodable.len(),
                    "fetched submissions"
                );
                RunState::ProcessingBatch {
                    range,
                    head,
                    checkpoint,
                    events: fetched.events,
                    undecodable: fetched.undecodable,
                }
            }
            RunState::ProcessingBatch {
                range,
                head,
                checkpoint,
                events,
                undecodable,
            } => {
                let mut outcomes = Vec::with_capacity(events.len());
                for event in &events {
                    outcomes.push(self.process_event(event).await);
                }
                RunState::Advancing {
                    range,
                    head,
                    checkpoint,
                    outcomes,
                    undecodable,
                }
            }
            RunState::Advancing {
                range,
                head,
                checkpoint,
                outcomes,
                undecodable,
            } => {
                let target = checkpoint.max(head);
                self.checkpoints.set(&self.network, target)?;
                let report = RunReport {
                    network: self.network.clone(),
                    from_block: range.from_block,
                    to_block: range.to_block,
                    checkpoint: target,
                    outcomes,
                    undecodable,
                };
                info!(
                    target: "processor",
                    network = %report.network,
                    from_block = report.from_block,
                    to_block = report.to_block,
                    checkpoint = report.checkpoint,
                    succeeded = report.succeeded(),
                    failed = report.failed(),
                    "pass complete"
                );
                RunState::Idle(report)
            }
            RunState::Idle(report) => RunState::Idle(report),
        };
        Ok(next)
    }

    async fn process_event(&self, event: &SubmissionEvent) -> EventOutcome {
        let status = match self.attest(event).await {
            Ok(outcome) => {
                info!(
                    target: "processor",
                    tx_hash = %event.tx_hash,
                    block = event.block_number,
                    submitter = %event.submitter,
                    attestation_tx = %outcome.tx_hash,
                    "attestation written"
                );
                EventStatus::Attested {
                    attestation_tx: outcome.tx_hash,
                }
            }
            Err(failure) => {
                warn!(
                    target: "processor",
                    tx_hash = %event.tx_hash,
                    block = event.block_number,
                    submitter = %event.submitter,
                    gist_url = %event.gist_url,
                    reason = failure.code(),
                    "{}",
                    ErrorKind::from(&failure)
                );
                match failure {
                    EventFailure::Rejected(r) => EventStatus::Rejected(r.reason),
                    EventFailure::WriteFailed(e) => EventStatus::WriteFailed(e.to_string()),
                }
            }
        };
        EventOutcome {
            tx_hash: event.tx_hash,
            block_number: event.block_number,
            submitter: event.submitter,
            gist_url: event.gist_url.clone(),
            status,
        }
    }

    async fn attest(&self, event: &SubmissionEvent) -> Result<AttestationOutcome, EventFailure> {
        let document = self.validator.fetch_and_validate(&event.gist_url).await?;
        self.validator.ensure_submitter(&document, event.submitter)?;
        let outcome = self
            .writer
            .create_attestation(
                &self.signer,
                document.address,
                &document.github_username,
                &event.gist_url,
            )
            .await?
            .into_result()?;
        Ok(outcome)
    }
}
