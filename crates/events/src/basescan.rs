use crate::errors::{EventSourceError, FetchFailure};
use crate::event::SubmissionEvent;
use crate::retry::RetryPolicy;
use crate::status_code::LogQueryResponse;
use crate::{EventSource, FetchedEvents};
use alloy_primitives::Address;
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use gist_attest_bindings::GistSubmitted;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const MODULE_LOGS: &str = "logs";
const ACTION_GET_LOGS: &str = "getLogs";

/// Where and how to query `GistSubmitted` logs.
#[derive(Debug, Clone)]
pub struct LogQueryConfig {
    /// endpoint of the etherscan-style log-query API
    pub api_url: Url,
    pub api_key: String,
    /// contract emitting `GistSubmitted`
    pub contract_address: Address,
    pub http_timeout: Duration,
}

/// Fetches `GistSubmitted` logs from a Basescan (etherscan compatible) API.
#[derive(Debug, Clone)]
pub struct BasescanClient {
    config: LogQueryConfig,
    retry: RetryPolicy,
    /// The inner reqwest client. Used to talk to the log-query API
    inner: reqwest::Client,
}

impl BasescanClient {
    pub fn new(config: LogQueryConfig, retry: RetryPolicy) -> Result<Self, EventSourceError> {
        if config.contract_address == Address::ZERO {
            return Err(EventSourceError::ContractNotConfigured);
        }
        let inner = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(EventSourceError::HttpClient)?;
        Ok(Self {
            config,
            retry,
            inner,
        })
    }

    /// Query the raw log records of the inclusive range `[from_block, to_block]`, retrying
    /// according to the [RetryPolicy].
    pub async fn query_logs(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<serde_json::Value>, EventSourceError> {
        let mut attempt = 1;
        loop {
            let failure = match self.try_query_logs(from_block, to_block).await {
                Ok(logs) => return Ok(logs),
                Err(failure) => failure,
            };

            if !self.retry.should_retry(attempt) {
                warn!(
                    target: "event_source",
                    attempt, from_block, to_block,
                    "giving up on log query: {failure}"
                );
                return Err(EventSourceError::SourceUnavailable {
                    attempts: attempt,
                    last_error: failure,
                });
            }

            let delay = self.retry.delay_for(&failure);
            warn!(
                target: "event_source",
                attempt,
                max_attempts = self.retry.attempts(),
                delay_ms = delay.as_millis() as u64,
                "log query failed, retrying: {failure}"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn try_query_logs(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<serde_json::Value>, FetchFailure> {
        let topic0 = GistSubmitted::SIGNATURE_HASH.to_string();
        let address = self.config.contract_address.to_string();
        let from = format!("{from_block:#x}");
        let to = format!("{to_block:#x}");

        let response = self
            .inner
            .get(self.config.api_url.clone())
            .query(&[
                ("module", MODULE_LOGS),
                ("action", ACTION_GET_LOGS),
                ("address", address.as_str()),
                ("topic0", topic0.as_str()),
                ("fromBlock", from.as_str()),
                ("toBlock", to.as_str()),
                ("apikey", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchFailure::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::HttpStatus(status.as_u16()));
        }

        let body: LogQueryResponse = response
            .json()
            .await
            .map_err(|e| FetchFailure::Transport(e.without_url().to_string()))?;

        body.into_logs()
    }
}

#[async_trait]
impl EventSource for BasescanClient {
    async fn fetch_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<FetchedEvents, EventSourceError> {
        debug!(target: "event_source", from_block, to_block, "querying GistSubmitted logs");
        let records = self.query_logs(from_block, to_block).await?;

        let mut fetched = FetchedEvents::default();
        for record in &records {
            match SubmissionEvent::from_record(record) {
                Ok(event) => fetched.events.push(event),
                Err(undecodable) => {
                    warn!(target: "event_source", "skipping log: {undecodable}");
                    fetched.undecodable.push(undecodable);
                }
            }
        }
        fetched.events.sort_by_key(|e| (e.block_number, e.log_index));

        info!(
            target: "event_source",
            from_block, to_block,
            count = fetched.events.len(),
            skipped = fetched.undecodable.len(),
            "fetched gist submissions"
        );
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::fixture_log_json;
    use alloy_primitives::{address, U256};
    use httpmock::prelude::*;

    const CONTRACT: Address = address!("0x1111111111111111111111111111111111111111");

    fn client(server: &MockServer, retry: RetryPolicy) -> BasescanClient {
        BasescanClient::new(
            LogQueryConfig {
                api_url: Url::parse(&server.url("/api")).unwrap(),
                api_key: "test-key".to_string(),
                contract_address: CONTRACT,
                http_timeout: DEFAULT_HTTP_TIMEOUT,
            },
            retry,
        )
        .unwrap()
    }

    fn log_at(block: u64, log_index: u64, url: &str) -> serde_json::Value {
        let encoded = GistSubmitted {
            submitter: address!("0x00000000000000000000000000000000000000bb"),
            gistUrl: url.to_string(),
            timestamp: U256::from(1_700_000_000u64),
        }
        .encode_log_data();
        let mut log = fixture_log_json();
        log["topics"] = serde_json::json!(encoded.topics());
        log["data"] = serde_json::json!(encoded.data);
        log["blockNumber"] = serde_json::json!(format!("{block:#x}"));
        log["logIndex"] = serde_json::json!(format!("{log_index:#x}"));
        log
    }

    #[tokio::test]
    async fn test_query_parameters_and_decoding() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api")
                .query_param("module", "logs")
                .query_param("action", "getLogs")
                .query_param("address", CONTRACT.to_string())
                .query_param("topic0", GistSubmitted::SIGNATURE_HASH.to_string())
                .query_param("fromBlock", "0x65")
                .query_param("toBlock", "0x69")
                .query_param("apikey", "test-key");
            then.status(200).json_body(serde_json::json!({
                "status": "1",
                "message": "OK",
                "result": [fixture_log_json()]
            }));
        });

        let events = client(&server, RetryPolicy::without_delay(3))
            .fetch_events(101, 105)
            .await
            .unwrap()
            .events;

        mock.assert();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].gist_url, "https://gist.github.com/alice/aa11bb22");
        assert_eq!(events[0].timestamp, 1_700_000_000);
        assert_eq!(events[0].block_number, 103);
    }

    #[tokio::test]
    async fn test_events_are_ordered_by_block_then_log_index() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api");
            then.status(200).json_body(serde_json::json!({
                "status": "1",
                "message": "OK",
                "result": [
                    log_at(12, 0, "https://gist.github.com/c/cc"),
                    log_at(10, 3, "https://gist.github.com/b/bb"),
                    log_at(10, 1, "https://gist.github.com/a/aa"),
                ]
            }));
        });

        let events = client(&server, RetryPolicy::without_delay(3))
            .fetch_events(1, 20)
            .await
            .unwrap()
            .events;

        let order: Vec<_> = events
            .iter()
            .map(|e| (e.block_number, e.log_index))
            .collect();
        assert_eq!(order, vec![(10, 1), (10, 3), (12, 0)]);
    }

    #[tokio::test]
    async fn test_no_records_is_confirmed_empty() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api");
            then.status(200).json_body(serde_json::json!({
                "status": "0",
                "message": "No records found",
                "result": []
            }));
        });

        let fetched = client(&server, RetryPolicy::without_delay(3))
            .fetch_events(1, 2)
            .await
            .unwrap();

        assert_eq!(fetched, FetchedEvents::default());
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retries() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api");
            then.status(503);
        });

        let err = client(&server, RetryPolicy::without_delay(3))
            .fetch_events(1, 2)
            .await
            .unwrap_err();

        mock.assert_hits(3);
        assert!(matches!(
            err,
            EventSourceError::SourceUnavailable {
                attempts: 3,
                last_error: FetchFailure::HttpStatus(503)
            }
        ));
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_retries() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api");
            then.status(200).json_body(serde_json::json!({
                "status": "0",
                "message": "NOTOK",
                "result": "Max rate limit reached"
            }));
        });

        let err = client(&server, RetryPolicy::without_delay(3))
            .fetch_events(1, 2)
            .await
            .unwrap_err();

        mock.assert_hits(3);
        assert!(matches!(
            err,
            EventSourceError::SourceUnavailable {
                last_error: FetchFailure::RateLimited(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_json_is_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api");
            then.status(200).body("<html>gateway</html>");
        });

        let err = client(&server, RetryPolicy::without_delay(2))
            .fetch_events(1, 2)
            .await
            .unwrap_err();

        mock.assert_hits(2);
        assert!(matches!(
            err,
            EventSourceError::SourceUnavailable { attempts: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_undecodable_log_is_skipped_and_reported() {
        let server = MockServer::start();
        let mut bad = log_at(11, 0, "https://gist.github.com/x/xx");
        bad["data"] = serde_json::json!("0x00");
        bad["transactionHash"] = serde_json::json!(format!("0x{}", "ab".repeat(32)));
        let mut malformed = log_at(11, 1, "https://gist.github.com/y/yy");
        malformed["topics"] = serde_json::json!(null);
        server.mock(|when, then| {
            when.method(GET).path("/api");
            then.status(200).json_body(serde_json::json!({
                "status": "1",
                "message": "OK",
                "result": [
                    log_at(12, 0, "https://gist.github.com/b/bb"),
                    bad,
                    malformed,
                    log_at(10, 0, "https://gist.github.com/a/aa"),
                ]
            }));
        });

        let fetched = client(&server, RetryPolicy::without_delay(3))
            .fetch_events(1, 200)
            .await
            .unwrap();

        let urls: Vec<_> = fetched.events.iter().map(|e| e.gist_url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://gist.github.com/a/aa", "https://gist.github.com/b/bb"]
        );
        assert_eq!(fetched.undecodable.len(), 2);
        assert_eq!(fetched.undecodable[0].tx_hash, format!("0x{}", "ab".repeat(32)));
        assert_eq!(fetched.undecodable[0].block, "0xb");
    }

    #[tokio::test]
    async fn test_transient_failure_then_success() {
        let server = MockServer::start_async().await;
        let outage = server
            .mock_async(|when, then| {
                when.method(GET).path("/api");
                then.status(503);
            })
            .await;
        let retry = RetryPolicy {
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
            rate_limit_delay: Duration::from_millis(500),
        };
        let client = client(&server, retry);

        // the source recovers while the client waits out its first retry delay
        let recover = async {
            while outage.hits_async().await == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            outage.delete_async().await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/api");
                    then.status(200).json_body(serde_json::json!({
                        "status": "1",
                        "message": "OK",
                        "result": [log_at(10, 0, "https://gist.github.com/a/aa")]
                    }));
                })
                .await
        };
        let (fetched, recovered) = tokio::join!(client.fetch_events(1, 20), recover);

        let fetched = fetched.unwrap();
        assert_eq!(fetched.events.len(), 1);
        assert_eq!(fetched.events[0].block_number, 10);
        recovered.assert_hits_async(1).await;
    }

    #[test]
    fn test_zero_contract_is_rejected() {
        let err = BasescanClient::new(
            LogQueryConfig {
                api_url: Url::parse("https://api-sepolia.basescan.org/api").unwrap(),
                api_key: String::new(),
                contract_address: Address::ZERO,
                http_timeout: DEFAULT_HTTP_TIMEOUT,
            },
            RetryPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EventSourceError::ContractNotConfigured));
    }
}
