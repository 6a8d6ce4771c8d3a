//! Verification of identity claims published as github gists.
//!
//! A claim is a json document binding an ethereum address to a github username, signed with
//! the key of that address. [ClaimValidator] fetches it through a [GistSource] and runs it
//! through every gate, reporting the first failure as a [ClaimRejection].
pub mod document;
pub use document::{validate_document, ClaimDocument, VerificationResult, REQUIRED_FIELDS};

pub mod errors;
pub use errors::{ClaimRejection, RejectionReason};

pub mod freshness;
pub use freshness::{Clock, FixedClock, FreshnessPolicy, SystemClock};

pub mod gist;
pub use gist::{
    Gist, GistFile, GistSource, GithubConfig, GithubGistClient, StaticGistSource,
    DEFAULT_GITHUB_API_URL,
};

pub mod locator;
pub use locator::GistLocator;

pub mod signature;

mod validator;
pub use validator::ClaimValidator;
