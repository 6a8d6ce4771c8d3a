use crate::document::{validate_document, ClaimDocument, VerificationResult};
use crate::errors::{ClaimRejection, RejectionReason};
use crate::freshness::{Clock, FreshnessPolicy};
use crate::gist::GistSource;
use crate::locator::GistLocator;
use alloy_primitives::Address;
use tracing::{debug, info};

/// Runs every gate a claim must pass before it may be attested.
#[derive(Debug, Clone)]
pub struct ClaimValidator<S, C> {
    source: S,
    clock: C,
    freshness: FreshnessPolicy,
}

impl<S: GistSource, C: Clock> ClaimValidator<S, C> {
    pub fn new(source: S, clock: C) -> Self {
        Self::with_policy(source, clock, FreshnessPolicy::default())
    }

    pub fn with_policy(source: S, clock: C, freshness: FreshnessPolicy) -> Self {
        Self {
            source,
            clock,
            freshness,
        }
    }

    /// Locate, fetch and validate the claim published at `gist_url`.
    ///
    /// Gates run in order: url shape, fetch, file selection, json, structure, signature,
    /// freshness. The first failing gate decides the rejection reason.
    pub async fn fetch_and_validate(&self, gist_url: &str) -> Result<ClaimDocument, ClaimRejection> {
        let locator = GistLocator::parse(gist_url)?;
        let gist = self.source.fetch_gist(&locator.gist_id).await?;
        let (file_name, raw) = gist.verification_file()?;
        debug!(
            target: "claim_validator",
            gist_id = %locator.gist_id,
            file = file_name,
            "validating claim document"
        );

        let document = validate_document(raw, self.clock.now(), &self.freshness)?;
        info!(
            target: "claim_validator",
            username = %document.github_username,
            address = %document.address,
            "claim document is valid"
        );
        Ok(document)
    }

    pub fn verification(&self, document: &ClaimDocument, submitter: Address) -> VerificationResult {
        document.verification(submitter)
    }

    /// Whether the signer of `document` is the account that submitted it on chain.
    pub fn verify(&self, document: &ClaimDocument, submitter: Address) -> bool {
        self.verification(document, submitter).matches_submitter
    }

    /// [Self::verify] as a gate.
    pub fn ensure_submitter(
        &self,
        document: &ClaimDocument,
        submitter: Address,
    ) -> Result<(), ClaimRejection> {
        let result = self.verification(document, submitter);
        if result.matches_submitter {
            return Ok(());
        }
        let recovered = result
            .recovered_address
            .map(|a| a.to_string())
            .unwrap_or_else(|| "nothing".to_string());
        Err(ClaimRejection::new(
            RejectionReason::SubmitterMismatch,
            format!("signature recovers to {recovered}, event submitted by {submitter}"),
        ))
    }
}
