//! Placing model findings onto the diff.
//!
//! Each finding is turned into a position once, right after the review
//! pass, using the index that produced the annotated text the model saw.
//! Findings that cannot be placed keep their error so callers can report
//! them instead of dropping them.

use serde::Serialize;

use crate::models::anchor::{AnchorIndex, AnchorRef, LineDescriptor, ResolvedPosition, Side};
use crate::models::diff::DiffFile;
use crate::models::finding::Finding;
use crate::models::LINE_TYPE_NEW;

use super::resolver::{resolve, Resolved};
use super::validator::{preferred_side, single_sided, validate};
use super::AnchorError;

/// A finding together with where it lands in the diff.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CitedFinding {
    pub finding: Finding,
    /// Anchor the finding cited, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_id: Option<String>,
    /// Single-sided position ready for a discussion, when placement succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<ResolvedPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    /// Post-change path of the diff entry the position belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_path: Option<String>,
    /// Pre-change path of that entry; differs from `new_path` on a rename.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    /// Why placement failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build the reference a finding cites: its anchor when present, otherwise
/// its legacy file/line location (defaulting to `new_line`).
///
/// Returns `None` when the finding has no usable location at all.
pub fn reference_for(finding: &Finding) -> Option<AnchorRef> {
    let location = finding.location.as_ref()?;

    if let Some(anchor) = location.anchor_id.as_deref().filter(|a| !a.trim().is_empty()) {
        return Some(AnchorRef::Anchor(anchor.to_string()));
    }

    let file_path = location.file.clone().filter(|f| !f.is_empty())?;
    let line = location.start_line?;
    Some(AnchorRef::Legacy(LineDescriptor {
        line_type: location
            .line_type
            .clone()
            .unwrap_or_else(|| LINE_TYPE_NEW.to_string()),
        file_path,
        line,
    }))
}

/// Resolve, validate, and collapse one finding to a single-sided position.
pub fn place_finding(
    finding: &Finding,
    index: &AnchorIndex,
    files: &[DiffFile],
) -> Result<ResolvedPosition, AnchorError> {
    place(finding, index, files).map(|placed| placed.position)
}

/// Like [`place_finding`], keeping the diff entry the position belongs to.
fn place<'a>(
    finding: &Finding,
    index: &AnchorIndex,
    files: &'a [DiffFile],
) -> Result<Resolved<'a>, AnchorError> {
    let reference = reference_for(finding).ok_or(AnchorError::MissingLocation)?;
    let resolved = resolve(&reference, index, files)?;
    let position = single_sided(validate(resolved.position, resolved.file)?);
    Ok(Resolved {
        position,
        file: resolved.file,
    })
}

/// Place every finding in `findings`, keeping failures alongside successes.
pub fn cite_all(findings: &[Finding], index: &AnchorIndex, files: &[DiffFile]) -> Vec<CitedFinding> {
    findings
        .iter()
        .map(|finding| {
            let anchor_id = finding
                .location
                .as_ref()
                .and_then(|l| l.anchor_id.clone());
            match place(finding, index, files) {
                Ok(Resolved { position, file }) => CitedFinding {
                    finding: finding.clone(),
                    anchor_id,
                    side: preferred_side(&position),
                    position: Some(position),
                    new_path: Some(file.effective_new_path().to_string()),
                    old_path: Some(file.effective_old_path().to_string()),
                    error: None,
                },
                Err(err) => {
                    tracing::warn!(title = %finding.title, error = %err, "could not place finding");
                    CitedFinding {
                        finding: finding.clone(),
                        anchor_id,
                        error: Some(err.to_string()),
                        ..Default::default()
                    }
                }
            }
        })
        .collect()
}
