//! GitLab REST payloads (the subset this tool reads and writes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of `GET /merge_requests/:iid/versions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrVersion {
    pub id: u64,
    #[serde(default)]
    pub head_commit_sha: String,
    #[serde(default)]
    pub base_commit_sha: String,
    #[serde(default)]
    pub start_commit_sha: String,
    /// ISO-8601 timestamp as sent by the server.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub merge_request_id: Option<u64>,
    #[serde(default)]
    pub state: Option<String>,
}

impl MrVersion {
    /// Creation time; missing or unparseable timestamps sort as the epoch.
    pub fn created(&self) -> DateTime<Utc> {
        self.created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Pick the most recently created version.
///
/// Ties keep the first one listed, which is how GitLab orders newest-first.
pub fn latest_version(versions: &[MrVersion]) -> Option<&MrVersion> {
    versions.iter().reduce(|best, v| if v.created() > best.created() { v } else { best })
}

/// `position` object of a diff discussion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionPosition {
    /// Always `text` for line comments.
    pub position_type: String,
    pub base_sha: String,
    pub head_sha: String,
    pub start_sha: String,
    pub new_path: String,
    pub old_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_line: Option<u32>,
}

/// Body of `POST /merge_requests/:iid/discussions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionRequest {
    pub body: String,
    pub position: DiscussionPosition,
}

/// The created discussion, as returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: String,
    #[serde(default)]
    pub individual_note: bool,
}
