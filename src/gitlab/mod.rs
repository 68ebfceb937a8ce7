//! GitLab collaborators: fetching merge request diffs and versions, and
//! posting positioned discussions.
//!
//! The adopt flow depends only on the [`DiffSource`] and
//! [`DiscussionPoster`] traits; [`GitlabClient`] implements both over
//! the REST API.

pub mod client;
pub mod types;
pub mod url;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::diff::DiffFile;

pub use client::GitlabClient;
pub use types::{Discussion, DiscussionPosition, DiscussionRequest, MrVersion, latest_version};
pub use url::{ParsedMrUrl, parse_mr_url};

/// Errors from GitLab API calls.
#[derive(Error, Debug)]
pub enum GitlabError {
    #[error("no GitLab token configured (set MRPIN_GITLAB_TOKEN or GITLAB_TOKEN)")]
    MissingToken,

    #[error("invalid merge request URL: {0}")]
    InvalidMrUrl(String),

    #[error("invalid GitLab API URL: {0}")]
    InvalidApiUrl(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{endpoint} failed with HTTP {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
}

/// A merge request addressed by project (numeric id or full path) and iid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrRef {
    pub project: String,
    pub iid: u64,
}

impl From<&ParsedMrUrl> for MrRef {
    fn from(parsed: &ParsedMrUrl) -> Self {
        Self {
            project: parsed.project_path.clone(),
            iid: parsed.iid,
        }
    }
}

impl std::fmt::Display for MrRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}!{}", self.project, self.iid)
    }
}

/// Read side of a merge request.
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// All diff versions, in server order.
    async fn fetch_versions(&self, mr: &MrRef) -> Result<Vec<MrVersion>, GitlabError>;

    /// Current per-file diffs.
    async fn fetch_diffs(&self, mr: &MrRef) -> Result<Vec<DiffFile>, GitlabError>;
}

/// Write side of a merge request.
#[async_trait]
pub trait DiscussionPoster: Send + Sync {
    /// Start a new positioned discussion thread.
    async fn create_discussion(
        &self,
        mr: &MrRef,
        request: &DiscussionRequest,
    ) -> Result<Discussion, GitlabError>;
}
