//! Access to gists and selection of the verification file inside one.
use crate::errors::{ClaimRejection, RejectionReason};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("gist-attest/", env!("CARGO_PKG_VERSION"));
const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
const VERIFICATION_KEYWORDS: [&str; 2] = ["verification", "attestation"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GistFile {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content: Option<String>,
    /// set by the host when `content` was cut short
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub raw_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Gist {
    #[serde(default)]
    pub id: String,
    /// files keyed by name, iterated in name order
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
}

impl Gist {
    /// Gist holding the given `(name, content)` files.
    pub fn from_files<'a>(id: &str, files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let files = files
            .into_iter()
            .map(|(name, content)| {
                let file = GistFile {
                    filename: name.to_string(),
                    content: Some(content.to_string()),
                    truncated: false,
                    raw_url: None,
                };
                (name.to_string(), file)
            })
            .collect();
        Self {
            id: id.to_string(),
            files,
        }
    }

    /// Content of the first file, in name order, whose name ends in `.json` or mentions
    /// verification/attestation, and which has content.
    pub fn verification_file(&self) -> Result<(&str, &str), ClaimRejection> {
        self.files
            .iter()
            .filter(|(name, _)| is_verification_file_name(name))
            .find_map(|(name, file)| match file.content.as_deref() {
                Some(content) if !content.is_empty() => Some((name.as_str(), content)),
                _ => None,
            })
            .ok_or_else(|| {
                ClaimRejection::new(
                    RejectionReason::NoVerificationFile,
                    format!("no verification json found in gist {}", self.id),
                )
            })
    }
}

pub fn is_verification_file_name(name: &str) -> bool {
    let name = name.to_lowercase();
    name.ends_with(".json") || VERIFICATION_KEYWORDS.iter().any(|k| name.contains(k))
}

#[async_trait]
pub trait GistSource: Send + Sync {
    /// Fetch a gist with the full content of each of its files.
    async fn fetch_gist(&self, gist_id: &str) -> Result<Gist, ClaimRejection>;
}

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_url: Url,
    /// optional token, raises rate limits and grants access to secret gists
    pub token: Option<String>,
    pub http_timeout: Duration,
}

/// Fetches gists from the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GithubGistClient {
    config: GithubConfig,
    inner: reqwest::Client,
}

impl GithubGistClient {
    pub fn new(config: GithubConfig) -> Result<Self, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { config, inner })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self
            .inner
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT_GITHUB_JSON);
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ClaimRejection> {
        let response = self
            .request(url)
            .send()
            .await
            .map_err(|e| fetch_failed(format!("{url}: {}", e.without_url())))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_failed(format!("{url}: http status {status}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl GistSource for GithubGistClient {
    async fn fetch_gist(&self, gist_id: &str) -> Result<Gist, ClaimRejection> {
        let url = format!(
            "{}/gists/{}",
            self.config.api_url.as_str().trim_end_matches('/'),
            gist_id
        );
        debug!(target: "claim_validator", gist_id, "fetching gist");

        let mut gist: Gist = self
            .get(&url)
            .await?
            .json()
            .await
            .map_err(|e| fetch_failed(format!("{url}: {}", e.without_url())))?;

        for (name, file) in gist.files.iter_mut() {
            let Some(raw_url) = file.raw_url.as_deref().filter(|_| file.truncated) else {
                continue;
            };
            trace!(target: "claim_validator", gist_id, file = %name, "fetching truncated file");
            let content = self
                .get(raw_url)
                .await?
                .text()
                .await
                .map_err(|e| fetch_failed(format!("{raw_url}: {}", e.without_url())))?;
            file.content = Some(content);
            file.truncated = false;
        }
        Ok(gist)
    }
}

/// In-memory gists, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct StaticGistSource {
    gists: HashMap<String, Gist>,
}

impl StaticGistSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gist(mut self, gist: Gist) -> Self {
        self.gists.insert(gist.id.clone(), gist);
        self
    }
}

#[async_trait]
impl GistSource for StaticGistSource {
    async fn fetch_gist(&self, gist_id: &str) -> Result<Gist, ClaimRejection> {
        self.gists
            .get(gist_id)
            .cloned()
            .ok_or_else(|| fetch_failed(format!("gist {gist_id} not found")))
    }
}

fn fetch_failed(detail: String) -> ClaimRejection {
    ClaimRejection::new(RejectionReason::FetchFailed, detail)
}
