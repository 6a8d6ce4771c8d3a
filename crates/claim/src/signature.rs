//! Format checks and EIP-191 personal-message recovery.
use crate::errors::{ClaimRejection, RejectionReason};
use alloy_primitives::{hex, Address, Signature};

/// Length of a `0x` prefixed 65 byte signature.
pub const SIGNATURE_HEX_LEN: usize = 132;
const ADDRESS_HEX_LEN: usize = 42;

/// A signature is well formed iff it is `0x` followed by exactly 130 hex characters.
pub fn is_well_formed_signature(signature: &str) -> bool {
    signature.len() == SIGNATURE_HEX_LEN
        && signature.starts_with("0x")
        && signature[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Parse a `0x` prefixed address. All-lowercase and all-uppercase forms are accepted as is,
/// mixed case must carry a valid EIP-55 checksum.
pub fn parse_address(value: &str) -> Option<Address> {
    if value.len() != ADDRESS_HEX_LEN || !value.starts_with("0x") {
        return None;
    }
    let digits = &value[2..];
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(value, None).ok()
    } else {
        value.parse().ok()
    }
}

/// Recover the address that signed `message` as an EIP-191 personal message.
pub fn recover_signer(message: &str, signature: &str) -> Result<Address, ClaimRejection> {
    let bytes = hex::decode(signature).map_err(|e| {
        ClaimRejection::new(RejectionReason::SignatureInvalid, format!("not hex: {e}"))
    })?;
    let signature = Signature::from_raw(&bytes).map_err(|e| {
        ClaimRejection::new(RejectionReason::SignatureInvalid, format!("malformed: {e}"))
    })?;
    signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|e| {
            ClaimRejection::new(
                RejectionReason::SignatureInvalid,
                format!("cannot recover signer: {e}"),
            )
        })
}
