//! Anchor resolution: turn a cited anchor (or legacy line descriptor) back
//! into a file position against the current diff.

use crate::models::anchor::{AnchorEntry, AnchorIndex, AnchorRef, LineDescriptor, ResolvedPosition, Side};
use crate::models::diff::DiffFile;
use crate::models::{LINE_TYPE_NEW, LINE_TYPE_OLD};

use super::marker::normalize_anchor_id;
use super::AnchorError;

/// A resolved position together with the diff entry it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub position: ResolvedPosition,
    pub file: &'a DiffFile,
}

/// Resolve `reference` against `index` and locate its file in `files`.
///
/// `index` must have been rebuilt from the same `files`; a missing anchor
/// means the diff moved on and is never guessed around.
pub fn resolve<'a>(
    reference: &AnchorRef,
    index: &AnchorIndex,
    files: &'a [DiffFile],
) -> Result<Resolved<'a>, AnchorError> {
    match reference {
        AnchorRef::Anchor(raw) => {
            let entry = lookup(raw, index)?;
            let file = file_for_entry(files, entry)?;
            Ok(Resolved {
                position: position_for_entry(entry),
                file,
            })
        }
        AnchorRef::Legacy(descriptor) => {
            let position = position_for_descriptor(descriptor)?;
            let side = if position.new_line.is_some() { Side::New } else { Side::Old };
            let file = find_file(files, &position.file_path, side)?;
            Ok(Resolved { position, file })
        }
    }
}

/// Look up an anchor id as cited by the model.
pub fn lookup<'i>(raw: &str, index: &'i AnchorIndex) -> Result<&'i AnchorEntry, AnchorError> {
    normalize_anchor_id(raw)
        .and_then(|id| index.get(&id))
        .ok_or_else(|| {
            tracing::debug!(anchor = raw, anchors = index.len(), "anchor not in current index");
            AnchorError::AnchorNotFound {
                anchor_id: raw.trim().to_string(),
            }
        })
}

/// Map an entry to a position on its authoritative side.
pub fn position_for_entry(entry: &AnchorEntry) -> ResolvedPosition {
    match entry.side {
        Side::New => ResolvedPosition {
            file_path: entry.new_path.clone(),
            new_line: entry.new_line,
            old_line: None,
        },
        Side::Old => ResolvedPosition {
            file_path: entry.old_path.clone(),
            new_line: None,
            old_line: entry.old_line,
        },
    }
}

/// Map a legacy `(line_type, path, line)` citation to a position.
pub fn position_for_descriptor(descriptor: &LineDescriptor) -> Result<ResolvedPosition, AnchorError> {
    match descriptor.line_type.trim() {
        LINE_TYPE_NEW => Ok(ResolvedPosition::new_side(&descriptor.file_path, descriptor.line)),
        LINE_TYPE_OLD => Ok(ResolvedPosition::old_side(&descriptor.file_path, descriptor.line)),
        other => Err(AnchorError::UnsupportedLineType {
            line_type: other.to_string(),
        }),
    }
}

/// The diff entry an anchor was issued from.
///
/// Both recorded paths have to match, so a rename chain or a type change
/// that lists one path twice still lands on the entry that was annotated.
pub fn file_for_entry<'a>(files: &'a [DiffFile], entry: &AnchorEntry) -> Result<&'a DiffFile, AnchorError> {
    let issued_from: Vec<&DiffFile> = files
        .iter()
        .filter(|f| f.effective_new_path() == entry.new_path && f.effective_old_path() == entry.old_path)
        .collect();
    match pick(&issued_from, entry.side) {
        Some(file) => Ok(file),
        None => find_file(files, entry.authoritative().0, entry.side),
    }
}

/// Find the diff entry for `path` as cited on `side`.
///
/// Paths on the cited side are tried before paths on the other side.
/// Among several candidates, one that has a timeline on `side` wins.
pub fn find_file<'a>(files: &'a [DiffFile], path: &str, side: Side) -> Result<&'a DiffFile, AnchorError> {
    let on_side: Vec<&DiffFile> = files.iter().filter(|f| f.matches_side_path(side, path)).collect();
    let either: Vec<&DiffFile> = files.iter().filter(|f| f.matches_path(path)).collect();
    pick(&on_side, side)
        .or_else(|| pick(&either, side))
        .ok_or_else(|| AnchorError::FileNotInDiff {
            path: path.to_string(),
        })
}

fn pick<'a>(candidates: &[&'a DiffFile], side: Side) -> Option<&'a DiffFile> {
    candidates
        .iter()
        .find(|f| f.has_side(side))
        .or_else(|| candidates.first())
        .copied()
}
