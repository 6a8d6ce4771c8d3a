//! The signed claim document and the pure part of its validation.
use crate::errors::{ClaimRejection, RejectionReason};
use crate::freshness::FreshnessPolicy;
use crate::signature::{is_well_formed_signature, parse_address, recover_signer};
use alloy_primitives::Address;
use serde_json::{Map, Value};

pub const REQUIRED_FIELDS: [&str; 5] = [
    "message",
    "signature",
    "address",
    "github_username",
    "timestamp",
];

/// A claim that passed structural validation: "`address` belongs to `github_username`",
/// signed by the key of `address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimDocument {
    pub message: String,
    /// `0x` prefixed, 65 bytes
    pub signature: String,
    pub address: Address,
    pub github_username: String,
    /// unix seconds at which the claim was made
    pub timestamp: u64,
}

/// Outcome of comparing a claim's signer with the addresses it must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationResult {
    /// `None` if the signature does not recover at all
    pub recovered_address: Option<Address>,
    pub matches_claimed: bool,
    pub matches_submitter: bool,
}

impl VerificationResult {
    pub fn is_verified(&self) -> bool {
        self.matches_claimed && self.matches_submitter
    }
}

impl ClaimDocument {
    /// Check presence, non-emptiness and format of every required field.
    pub fn from_json(raw: &str) -> Result<Self, ClaimRejection> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ClaimRejection::new(RejectionReason::MalformedJson, e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(invalid("claim document is not a json object"));
        };
        Self::from_fields(&fields)
    }

    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ClaimRejection> {
        for name in REQUIRED_FIELDS {
            match fields.get(name) {
                None => return Err(invalid(format!("missing required field: {name}"))),
                Some(v) if is_empty(v) => {
                    return Err(invalid(format!("empty required field: {name}")))
                }
                Some(_) => {}
            }
        }

        let message = string_field(fields, "message")?;
        let signature = string_field(fields, "signature")?;
        let address_text = string_field(fields, "address")?;
        let github_username = string_field(fields, "github_username")?;
        let timestamp = timestamp_field(fields)?;

        let address = parse_address(&address_text)
            .ok_or_else(|| invalid(format!("invalid ethereum address: {address_text}")))?;
        if !is_well_formed_signature(&signature) {
            return Err(invalid(format!(
                "invalid signature format, expected 0x + 130 hex characters, got {} characters",
                signature.len()
            )));
        }

        Ok(Self {
            message,
            signature,
            address,
            github_username,
            timestamp,
        })
    }

    /// Address recovered from `signature` over `message`.
    pub fn recover_signer(&self) -> Result<Address, ClaimRejection> {
        recover_signer(&self.message, &self.signature)
    }

    /// Compare the recovered signer with the claimed address and with `submitter`.
    pub fn verification(&self, submitter: Address) -> VerificationResult {
        let recovered_address = self.recover_signer().ok();
        VerificationResult {
            recovered_address,
            matches_claimed: recovered_address == Some(self.address),
            matches_submitter: recovered_address == Some(submitter),
        }
    }
}

/// Structural, cryptographic and freshness validation of a claim document at time `now`.
///
/// The verdict depends only on the arguments.
pub fn validate_document(
    raw: &str,
    now: u64,
    freshness: &FreshnessPolicy,
) -> Result<ClaimDocument, ClaimRejection> {
    let document = ClaimDocument::from_json(raw)?;

    let recovered = document.recover_signer()?;
    if recovered != document.address {
        return Err(ClaimRejection::new(
            RejectionReason::SignatureInvalid,
            format!(
                "signature recovers to {recovered}, claim names {}",
                document.address
            ),
        ));
    }

    freshness.check(document.timestamp, now)?;
    Ok(document)
}

fn invalid(detail: impl Into<String>) -> ClaimRejection {
    ClaimRejection::new(RejectionReason::InvalidStructure, detail)
}

// null, false, 0, "" and empty containers count as missing
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn string_field(fields: &Map<String, Value>, name: &str) -> Result<String, ClaimRejection> {
    match fields.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(invalid(format!("field {name} must be a string"))),
    }
}

fn timestamp_field(fields: &Map<String, Value>) -> Result<u64, ClaimRejection> {
    let parsed = match fields.get("timestamp") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| invalid("timestamp must be a non-negative integer"))
}
