//! Side policy and position validation.
//!
//! The canonical-side rule lives here and only here: context lines are
//! addressed on the new timeline, and when a position carries both lines
//! the new one wins. The annotator and every consumer that collapses a
//! position to a single side call into this module.

use crate::models::anchor::{ResolvedPosition, Side};
use crate::models::diff::{DiffFile, DiffLineType};

use super::AnchorError;

/// Side an annotated line is indexed under.
pub fn canonical_side(line_type: DiffLineType) -> Side {
    match line_type {
        DiffLineType::Context | DiffLineType::Added => Side::New,
        DiffLineType::Removed => Side::Old,
    }
}

/// Side a single-sided comment should use for `position`.
///
/// `None` only when neither line is set.
pub fn preferred_side(position: &ResolvedPosition) -> Option<Side> {
    match (position.new_line, position.old_line) {
        (Some(_), _) => Some(Side::New),
        (None, Some(_)) => Some(Side::Old),
        (None, None) => None,
    }
}

/// Collapse `position` to exactly one line using [`preferred_side`].
pub fn single_sided(position: ResolvedPosition) -> ResolvedPosition {
    match preferred_side(&position) {
        Some(Side::New) => ResolvedPosition {
            old_line: None,
            ..position
        },
        Some(Side::Old) => ResolvedPosition {
            new_line: None,
            ..position
        },
        None => position,
    }
}

/// Enforce which side of `file` is addressable.
///
/// Deleted files lose any new-side line, new files lose any old-side line.
/// Fails when nothing addressable remains.
pub fn validate(
    mut position: ResolvedPosition,
    file: &DiffFile,
) -> Result<ResolvedPosition, AnchorError> {
    if file.is_deleted {
        position.new_line = None;
        if position.old_line.is_none() {
            return Err(violation(&position, file, "deleted file requires an old-side line"));
        }
    }

    if file.is_new {
        position.old_line = None;
        if position.new_line.is_none() {
            return Err(violation(&position, file, "new file requires a new-side line"));
        }
    }

    if position.new_line.is_none() && position.old_line.is_none() {
        return Err(violation(&position, file, "position requires a new-side or old-side line"));
    }

    Ok(position)
}

fn violation(position: &ResolvedPosition, file: &DiffFile, reason: &'static str) -> AnchorError {
    let path = if position.file_path.is_empty() {
        file.display_path().to_string()
    } else {
        position.file_path.clone()
    };
    AnchorError::FileStateViolation {
        path,
        is_new: file.is_new,
        is_deleted: file.is_deleted,
        reason,
    }
}
