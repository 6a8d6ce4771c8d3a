//! Rejection reasons of a claim.
use core::fmt;

/// Stable code naming the gate a claim failed. Every rejected claim carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// url is not a gist url with a hex identifier
    MalformedUrl,
    /// gist host could not be reached or answered with an error
    FetchFailed,
    /// no file of the gist looks like a verification document
    NoVerificationFile,
    /// verification file is not valid json
    MalformedJson,
    /// required field missing or empty, or address/signature badly formatted
    InvalidStructure,
    /// signature does not recover to the claimed address
    SignatureInvalid,
    /// claim is older than the maximum age
    Expired,
    /// claim is dated beyond the tolerated clock skew
    FutureTimestamp,
    /// signature does not recover to the on-chain submitter
    SubmitterMismatch,
}

impl RejectionReason {
    pub const fn code(&self) -> &'static str {
        match self {
            RejectionReason::MalformedUrl => "MalformedURL",
            RejectionReason::FetchFailed => "FetchFailed",
            RejectionReason::NoVerificationFile => "NoVerificationFile",
            RejectionReason::MalformedJson => "MalformedJSON",
            RejectionReason::InvalidStructure => "InvalidStructure",
            RejectionReason::SignatureInvalid => "SignatureInvalid",
            RejectionReason::Expired => "Expired",
            RejectionReason::FutureTimestamp => "FutureTimestamp",
            RejectionReason::SubmitterMismatch => "SubmitterMismatch",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("claim rejected ({reason}): {detail}")]
pub struct ClaimRejection {
    pub reason: RejectionReason,
    pub detail: String,
}

impl ClaimRejection {
    pub fn new(reason: RejectionReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}
