//! Http json-rpc transport shared by [crate::RpcChainHead] and [crate::RegistryWriter].
use alloy_rpc_client::RpcClient;
use alloy_transport_http::{reqwest, Http};
use std::time::Duration;
use url::Url;

/// Upper bound of a single json-rpc request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Reqwest client whose requests give up after `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Json-rpc client talking to `rpc_url` through `inner`.
pub fn rpc_client(inner: reqwest::Client, rpc_url: Url) -> RpcClient {
    let transport = Http::with_client(inner, rpc_url);
    let is_local = transport.guess_local();
    RpcClient::new(transport, is_local)
}
