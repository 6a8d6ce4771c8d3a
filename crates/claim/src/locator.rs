use crate::errors::{ClaimRejection, RejectionReason};
use url::Url;

/// Host serving the human facing gist pages.
pub const GIST_HOST: &str = "gist.github.com";

/// Identifies a gist from its page url, `https://gist.github.com/<owner>/<hex id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistLocator {
    pub owner: String,
    pub gist_id: String,
}

impl GistLocator {
    pub fn parse(gist_url: &str) -> Result<Self, ClaimRejection> {
        let malformed = |detail: &str| {
            ClaimRejection::new(
                RejectionReason::MalformedUrl,
                format!("{gist_url:?}: {detail}"),
            )
        };

        let url = Url::parse(gist_url).map_err(|e| malformed(&e.to_string()))?;
        if url.host_str() != Some(GIST_HOST) {
            return Err(malformed("host is not the gist host"));
        }

        let mut segments = url
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty());
        let (Some(owner), Some(gist_id)) = (segments.next(), segments.next()) else {
            return Err(malformed("path must be /<owner>/<gist id>"));
        };
        if !gist_id.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(malformed("gist id is not hexadecimal"));
        }

        Ok(Self {
            owner: owner.to_string(),
            gist_id: gist_id.to_string(),
        })
    }
}
