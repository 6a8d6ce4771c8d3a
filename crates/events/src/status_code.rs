//! Wire format of the log-query API and classification of its answers.
use crate::errors::FetchFailure;
use alloy_primitives::{Address, Bytes, B256};
use serde::Deserialize;

pub const STATUS_OK: &str = "1";
pub const STATUS_NOTOK: &str = "0";

/// message sent alongside `status: "0"` when the range simply holds no logs
pub const MESSAGE_NO_RECORDS: &str = "No records found";
const RATE_LIMIT_MARKER: &str = "rate limit";

#[derive(Debug, Deserialize)]
pub struct LogQueryResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    /// list of logs on success, a human readable string on error
    #[serde(default)]
    pub result: serde_json::Value,
}

/// Raw log record as returned by the log-query API. Quantities are hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    #[serde(default)]
    pub log_index: String,
    pub transaction_hash: B256,
}

impl LogQueryResponse {
    /// Turn an answer into the list of raw logs, or the reason the attempt failed.
    ///
    /// An empty `status: "0"` answer whose message is [MESSAGE_NO_RECORDS] is a confirmed
    /// empty range, not a failure.
    pub fn into_logs(self) -> Result<Vec<serde_json::Value>, FetchFailure> {
        let result_text = match &self.result {
            serde_json::Value::String(s) => s.clone(),
            _ => String::new(),
        };

        if result_text.to_lowercase().contains(RATE_LIMIT_MARKER) {
            return Err(FetchFailure::RateLimited(result_text));
        }

        match (self.status.as_str(), self.result) {
            (STATUS_OK, serde_json::Value::Array(logs)) => Ok(logs),
            (STATUS_NOTOK, serde_json::Value::Array(logs))
                if logs.is_empty() && self.message.starts_with(MESSAGE_NO_RECORDS) =>
            {
                Ok(logs)
            }
            (STATUS_NOTOK, serde_json::Value::Null) if self.message.starts_with(MESSAGE_NO_RECORDS) => {
                Ok(Vec::new())
            }
            (status, _) => Err(FetchFailure::Upstream(format!(
                "status {status}, message {:?}, result {:?}",
                self.message, result_text
            ))),
        }
    }
}

/// Parse an API quantity. Hex (`0x..`) and plain decimal are accepted; the API reports
/// zero as a bare `0x`. An empty string is not a quantity.
pub fn parse_quantity(value: &str) -> Result<u64, String> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some("") => Ok(0),
        Some(hex) => u64::from_str_radix(hex, 16).map_err(|e| format!("{value:?}: {e}")),
        None if value.is_empty() => Err("empty quantity".to_string()),
        None => value.parse::<u64>().map_err(|e| format!("{value:?}: {e}")),
    }
}

/// Parse `logIndex`, which some answers omit for the first log of a transaction.
pub fn parse_log_index(value: &str) -> Result<u64, String> {
    if value.trim().is_empty() {
        return Ok(0);
    }
    parse_quantity(value)
}
