use crate::errors::UndecodableLog;
use crate::status_code::{parse_log_index, parse_quantity, RawLog};
use alloy_primitives::{Address, B256};
use alloy_sol_types::SolEvent;
use gist_attest_bindings::GistSubmitted;
use serde::Deserialize;

/// A decoded `GistSubmitted` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionEvent {
    /// account that emitted the submission, taken from the indexed topic
    pub submitter: Address,
    pub gist_url: String,
    /// unix seconds carried in the event payload
    pub timestamp: u64,
    pub tx_hash: B256,
    pub block_number: u64,
    pub log_index: u64,
    /// unix seconds of the block holding the log
    pub block_timestamp: u64,
}

impl SubmissionEvent {
    /// Parse one record of a log-query answer and decode it.
    pub fn from_record(record: &serde_json::Value) -> Result<Self, UndecodableLog> {
        let log = RawLog::deserialize(record).map_err(|e| {
            let field = |name: &str| {
                record
                    .get(name)
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string()
            };
            UndecodableLog {
                tx_hash: field("transactionHash"),
                block: field("blockNumber"),
                reason: format!("malformed log record: {e}"),
            }
        })?;
        Self::decode(&log)
    }

    /// Decode a raw log against the `GistSubmitted` ABI: `submitter` from `topics[1]`,
    /// `gistUrl` and `timestamp` from the data payload.
    pub fn decode(log: &RawLog) -> Result<Self, UndecodableLog> {
        let decode_err = |reason: String| UndecodableLog {
            tx_hash: log.transaction_hash.to_string(),
            block: log.block_number.clone(),
            reason,
        };

        if log.topics.first() != Some(&GistSubmitted::SIGNATURE_HASH) {
            return Err(decode_err("topic0 is not GistSubmitted".to_string()));
        }
        let event = GistSubmitted::decode_raw_log(log.topics.iter().copied(), &log.data)
            .map_err(|e| decode_err(e.to_string()))?;
        let timestamp = u64::try_from(event.timestamp)
            .map_err(|_| decode_err(format!("timestamp {} overflows u64", event.timestamp)))?;

        Ok(Self {
            submitter: event.submitter,
            gist_url: event.gistUrl,
            timestamp,
            tx_hash: log.transaction_hash,
            block_number: parse_quantity(&log.block_number).map_err(decode_err)?,
            log_index: parse_log_index(&log.log_index).map_err(decode_err)?,
            block_timestamp: parse_quantity(&log.time_stamp).map_err(decode_err)?,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy_primitives::{address, b256, U256};

    /// Raw log of `GistSubmitted(0x..aa, "https://gist.github.com/alice/aa11bb22", 1700000000)`
    /// as served by the log-query API.
    pub(crate) fn fixture_log_json() -> serde_json::Value {
        serde_json::json!({
            "address": "0x1111111111111111111111111111111111111111",
            "topics": [
                GistSubmitted::SIGNATURE_HASH.to_string(),
                "0x00000000000000000000000000000000000000000000000000000000000000aa"
            ],
            "data": concat!(
                "0x",
                "0000000000000000000000000000000000000000000000000000000000000040",
                "000000000000000000000000000000000000000000000000000000006553f100",
                "0000000000000000000000000000000000000000000000000000000000000026",
                "68747470733a2f2f676973742e6769746875622e636f6d2f616c6963652f6161",
                "3131626232320000000000000000000000000000000000000000000000000000"
            ),
            "blockNumber": "0x67",
            "timeStamp": "0x6553f10c",
            "gasPrice": "0x3b9aca00",
            "gasUsed": "0x5208",
            "logIndex": "0x",
            "transactionHash": "0x9f7f7f53c4ad0fa2c0e0e1dd0a5df1e4b9db2a4d13f61dc8f3c3e0b4f6b6f201",
            "transactionIndex": "0x1"
        })
    }

    #[test]
    fn test_decode_fixture_log() {
        let log: RawLog = serde_json::from_value(fixture_log_json()).unwrap();
        let event = SubmissionEvent::decode(&log).unwrap();

        assert_eq!(
            event,
            SubmissionEvent {
                submitter: address!("0x00000000000000000000000000000000000000aa"),
                gist_url: "https://gist.github.com/alice/aa11bb22".to_string(),
                timestamp: 1_700_000_000,
                tx_hash: b256!(
                    "0x9f7f7f53c4ad0fa2c0e0e1dd0a5df1e4b9db2a4d13f61dc8f3c3e0b4f6b6f201"
                ),
                block_number: 103,
                log_index: 0,
                block_timestamp: 1_700_000_012,
            }
        );
    }

    #[test]
    fn test_decode_matches_abi_encoder() {
        let submitter = address!("0x5B38Da6a701c568545dCfcB03FcB875f56beddC4");
        let encoded = GistSubmitted {
            submitter,
            gistUrl: "https://gist.github.com/bob/0123456789abcdef0123456789abcdef".to_string(),
            timestamp: U256::from(1_712_345_678u64),
        }
        .encode_log_data();

        let log = RawLog {
            address: Address::ZERO,
            topics: encoded.topics().to_vec(),
            data: encoded.data.clone(),
            block_number: "0x10".to_string(),
            time_stamp: "0x0".to_string(),
            log_index: "0x2".to_string(),
            transaction_hash: B256::ZERO,
        };
        let event = SubmissionEvent::decode(&log).unwrap();

        assert_eq!(event.submitter, submitter);
        assert_eq!(
            event.gist_url,
            "https://gist.github.com/bob/0123456789abcdef0123456789abcdef"
        );
        assert_eq!(event.timestamp, 1_712_345_678);
        assert_eq!(event.block_number, 16);
        assert_eq!(event.log_index, 2);
    }

    #[test]
    fn test_malformed_record_keeps_its_identity() {
        let mut json = fixture_log_json();
        json["topics"] = serde_json::json!("not a list");

        let err = SubmissionEvent::from_record(&json).unwrap_err();
        assert_eq!(
            err.tx_hash,
            "0x9f7f7f53c4ad0fa2c0e0e1dd0a5df1e4b9db2a4d13f61dc8f3c3e0b4f6b6f201"
        );
        assert_eq!(err.block, "0x67");
    }

    #[test]
    fn test_decode_rejects_foreign_topic() {
        let mut log: RawLog = serde_json::from_value(fixture_log_json()).unwrap();
        log.topics[0] = B256::repeat_byte(0x11);
        assert!(matches!(
            SubmissionEvent::decode(&log),
            Err(UndecodableLog { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_data() {
        let mut log: RawLog = serde_json::from_value(fixture_log_json()).unwrap();
        log.data = log.data.slice(..64).into();
        assert!(matches!(
            SubmissionEvent::decode(&log),
            Err(UndecodableLog { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_empty_block_number() {
        let mut log: RawLog = serde_json::from_value(fixture_log_json()).unwrap();
        log.block_number = String::new();
        assert!(matches!(
            SubmissionEvent::decode(&log),
            Err(UndecodableLog { .. })
        ));

        let mut log: RawLog = serde_json::from_value(fixture_log_json()).unwrap();
        log.time_stamp = String::new();
        assert!(SubmissionEvent::decode(&log).is_err());
    }

    #[test]
    fn test_decode_accepts_missing_log_index() {
        let mut json = fixture_log_json();
        json.as_object_mut().unwrap().remove("logIndex");
        let log: RawLog = serde_json::from_value(json).unwrap();
        assert_eq!(SubmissionEvent::decode(&log).unwrap().log_index, 0);
    }

    #[test]
    fn test_decode_rejects_oversized_timestamp() {
        let encoded = GistSubmitted {
            submitter: Address::ZERO,
            gistUrl: String::new(),
            timestamp: U256::MAX,
        }
        .encode_log_data();
        let log = RawLog {
            address: Address::ZERO,
            topics: encoded.topics().to_vec(),
            data: encoded.data.clone(),
            block_number: "0x1".to_string(),
            time_stamp: "0x1".to_string(),
            log_index: "0x0".to_string(),
            transaction_hash: B256::ZERO,
        };
        assert!(matches!(
            SubmissionEvent::decode(&log),
            Err(UndecodableLog { .. })
        ));
    }
}
