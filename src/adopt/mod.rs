//! Adopting a review finding as a positioned merge request discussion.
//!
//! This is the second phase of the anchor round trip. The diff that was
//! annotated for the model may be stale by now, so the flow always starts
//! from the server's latest version:
//!
//! 1. fetch versions and pick the newest by `created_at`
//! 2. refuse if the caller pinned a head SHA and the MR has moved on
//! 3. fetch the current diffs and rebuild the anchor index from scratch
//! 4. resolve, validate, and collapse the citation to a single side
//! 5. post (or, in a dry run, only build) the discussion

use serde::Serialize;
use thiserror::Error;

use crate::anchor::{annotate_with, resolve, validate, AnchorError, AnnotateOptions};
use crate::anchor::validator::single_sided;
use crate::gitlab::{
    latest_version, DiffSource, Discussion, DiscussionPoster, DiscussionPosition,
    DiscussionRequest, GitlabError, MrRef, MrVersion,
};
use crate::models::anchor::{AnchorRef, ResolvedPosition};
use crate::models::diff::DiffFile;

/// Errors from the adopt flow.
#[derive(Error, Debug)]
pub enum AdoptError {
    #[error("no diff versions found for merge request {0}")]
    NoVersions(String),

    #[error("merge request head moved: expected {expected}, latest version is {actual}")]
    HeadShaMismatch { expected: String, actual: String },

    #[error("comment body is empty")]
    EmptyBody,

    #[error(transparent)]
    Anchor(#[from] AnchorError),

    #[error(transparent)]
    Gitlab(#[from] GitlabError),
}

/// What to adopt, and where.
#[derive(Debug, Clone)]
pub struct AdoptRequest {
    pub mr: MrRef,
    /// Anchor id or legacy line descriptor cited by the finding.
    pub reference: AnchorRef,
    /// Markdown body of the discussion.
    pub body: String,
    /// Head SHA the finding was produced against, if known.
    pub expected_head_sha: Option<String>,
    /// Options the cited anchor was issued under.
    pub annotate: AnnotateOptions,
}

/// Outcome of an adopt call.
#[derive(Debug, Clone, Serialize)]
pub struct AdoptOutcome {
    pub version_id: u64,
    pub position: ResolvedPosition,
    pub request: DiscussionRequest,
    /// Set when the discussion was actually created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discussion: Option<Discussion>,
}

/// Build the discussion payload for a validated, single-sided position.
pub fn discussion_request(
    version: &MrVersion,
    file: &DiffFile,
    position: &ResolvedPosition,
    body: &str,
) -> DiscussionRequest {
    let position = single_sided(position.clone());
    DiscussionRequest {
        body: body.to_string(),
        position: DiscussionPosition {
            position_type: "text".to_string(),
            base_sha: version.base_commit_sha.clone(),
            head_sha: version.head_commit_sha.clone(),
            start_sha: version.start_commit_sha.clone(),
            new_path: file.effective_new_path().to_string(),
            old_path: file.effective_old_path().to_string(),
            new_line: position.new_line,
            old_line: position.old_line,
        },
    }
}

/// Resolve `request` against the live merge request and build the payload.
///
/// Nothing is posted. Use [`adopt`] to also create the discussion.
pub async fn prepare(
    source: &dyn DiffSource,
    request: &AdoptRequest,
) -> Result<AdoptOutcome, AdoptError> {
    if request.body.trim().is_empty() {
        return Err(AdoptError::EmptyBody);
    }

    let versions = source.fetch_versions(&request.mr).await?;
    let latest = latest_version(&versions)
        .ok_or_else(|| AdoptError::NoVersions(request.mr.to_string()))?;

    if let Some(expected) = request.expected_head_sha.as_deref() {
        if expected != latest.head_commit_sha {
            return Err(AdoptError::HeadShaMismatch {
                expected: expected.to_string(),
                actual: latest.head_commit_sha.clone(),
            });
        }
    }

    let files = source.fetch_diffs(&request.mr).await?;
    // Fresh numbering against the current diff, never a cached index.
    let annotated = annotate_with(&files, &request.annotate)?;
    tracing::debug!(
        mr = %request.mr,
        version = latest.id,
        anchors = annotated.index.len(),
        "rebuilt anchor index"
    );

    let resolved = resolve(&request.reference, &annotated.index, &files)?;
    let position = single_sided(validate(resolved.position, resolved.file)?);
    let payload = discussion_request(latest, resolved.file, &position, &request.body);

    Ok(AdoptOutcome {
        version_id: latest.id,
        position,
        request: payload,
        discussion: None,
    })
}

/// Resolve and post a discussion for `request`.
pub async fn adopt(
    source: &dyn DiffSource,
    poster: &dyn DiscussionPoster,
    request: &AdoptRequest,
) -> Result<AdoptOutcome, AdoptError> {
    let mut outcome = prepare(source, request).await?;
    let discussion = poster.create_discussion(&request.mr, &outcome.request).await?;
    tracing::info!(mr = %request.mr, discussion = %discussion.id, "discussion created");
    outcome.discussion = Some(discussion);
    Ok(outcome)
}
