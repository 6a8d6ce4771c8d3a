//! Solidity interfaces of the gist submission and attestation registry contracts.
//!
//! - [GistSubmitted]: event emitted by the submission contract, consumed by the event source
//! - [IAttestationRegistry]: write interface used by the attestation writer
use alloy_sol_types::sol;

sol! {
    /// Emitted when an account publishes the URL of its claim gist.
    #[derive(Debug, PartialEq, Eq)]
    event GistSubmitted(address indexed submitter, string gistUrl, uint256 timestamp);

    /// Registry storing address <-> github username bindings.
    interface IAttestationRegistry {
        function createAttestation(address ethAddress, string githubUsername, string gistUrl) external;
    }
}

/// Canonical signature of [GistSubmitted], hashed into `topic0` of its logs.
pub const GIST_SUBMITTED_SIGNATURE: &str = "GistSubmitted(address,string,uint256)";

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, keccak256, Address, U256};
    use alloy_sol_types::{SolCall, SolEvent};

    #[test]
    fn test_event_topic_is_signature_hash() {
        assert_eq!(GistSubmitted::SIGNATURE, GIST_SUBMITTED_SIGNATURE);
        assert_eq!(
            GistSubmitted::SIGNATURE_HASH,
            keccak256(GIST_SUBMITTED_SIGNATURE.as_bytes())
        );
    }

    #[test]
    fn test_event_data_layout() {
        let submitter: Address = address!("0x00000000000000000000000000000000000000aa");
        let event = GistSubmitted {
            submitter,
            gistUrl: "https://gist.github.com/alice/abc123".to_string(),
            timestamp: U256::from(1_700_000_000u64),
        };
        let log = event.encode_log_data();

        // topic0 + indexed submitter
        assert_eq!(log.topics().len(), 2);
        assert_eq!(log.topics()[1].as_slice()[12..], submitter.0[..]);
        // head: string offset + uint256, tail: length + 36 bytes padded to 64
        assert_eq!(log.data.len(), 32 * 3 + 64);
        assert_eq!(log.data[31], 0x40);

        let decoded =
            GistSubmitted::decode_raw_log(log.topics().iter().copied(), &log.data).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_create_attestation_selector() {
        assert_eq!(
            IAttestationRegistry::createAttestationCall::SIGNATURE,
            "createAttestation(address,string,string)"
        );
        let call = IAttestationRegistry::createAttestationCall {
            ethAddress: Address::ZERO,
            githubUsername: "alice".to_string(),
            gistUrl: "https://gist.github.com/alice/abc123".to_string(),
        };
        let encoded = call.abi_encode();
        assert_eq!(
            encoded[..4],
            keccak256("createAttestation(address,string,string)".as_bytes())[..4]
        );
    }
}
