//! Diff-related types: one changed file as reported by the host.

use serde::{Deserialize, Serialize};

use super::anchor::Side;

/// The type of a line in a unified diff hunk body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffLineType {
    /// Line exists only in the new version (added).
    Added,
    /// Line exists only in the old version (removed).
    Removed,
    /// Line is unchanged (context).
    Context,
}

impl DiffLineType {
    /// Classify a hunk body line by its leading marker.
    ///
    /// Returns `None` for anything that is not a counted line, such as
    /// `\ No newline at end of file`.
    pub fn classify(line: &str) -> Option<Self> {
        match line.as_bytes().first() {
            Some(b' ') => Some(DiffLineType::Context),
            Some(b'+') => Some(DiffLineType::Added),
            Some(b'-') => Some(DiffLineType::Removed),
            _ => None,
        }
    }
}

/// A single changed file in a merge request.
///
/// Field names on the wire match the GitLab `/diffs` payload
/// (`new_file`, `deleted_file`, `renamed_file`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFile {
    /// Path before the change. Equal to `new_path` unless renamed.
    #[serde(default)]
    pub old_path: String,
    /// Path after the change.
    #[serde(default)]
    pub new_path: String,
    /// Whether the file was added by this change.
    #[serde(default, rename = "new_file")]
    pub is_new: bool,
    /// Whether the file was deleted by this change.
    #[serde(default, rename = "deleted_file")]
    pub is_deleted: bool,
    /// Whether the file was renamed.
    #[serde(default, rename = "renamed_file")]
    pub is_renamed: bool,
    /// Raw unified diff text, starting at the first hunk header.
    ///
    /// `None` for pure renames, binary files, or collapsed diffs.
    #[serde(default)]
    pub diff: Option<String>,
}

impl DiffFile {
    /// The path shown to readers: the new path when present, else the old one.
    pub fn display_path(&self) -> &str {
        if self.new_path.is_empty() {
            &self.old_path
        } else {
            &self.new_path
        }
    }

    /// Post-change path, falling back to the old path when the host left it blank.
    pub fn effective_new_path(&self) -> &str {
        if self.new_path.is_empty() { &self.old_path } else { &self.new_path }
    }

    /// Pre-change path, falling back to the new path when the host left it blank.
    pub fn effective_old_path(&self) -> &str {
        if self.old_path.is_empty() { &self.new_path } else { &self.old_path }
    }

    /// Whether `path` names this file on either side of the change.
    pub fn matches_path(&self, path: &str) -> bool {
        !path.is_empty() && (self.new_path == path || self.old_path == path)
    }

    /// Whether `path` names this file on the given side.
    pub fn matches_side_path(&self, side: Side, path: &str) -> bool {
        !path.is_empty()
            && match side {
                Side::New => self.effective_new_path() == path,
                Side::Old => self.effective_old_path() == path,
            }
    }

    /// Whether this file has a timeline on `side` at all.
    ///
    /// Added files have no old side and deleted files have no new side.
    pub fn has_side(&self, side: Side) -> bool {
        match side {
            Side::New => !self.is_deleted,
            Side::Old => !self.is_new,
        }
    }

    /// Lowercased extension of the display path (empty when there is none).
    pub fn extension(&self) -> String {
        let path = self.display_path();
        let name = path.rsplit('/').next().unwrap_or(path);
        match name.rfind('.') {
            Some(idx) => name[idx + 1..].to_lowercase(),
            None => String::new(),
        }
    }

    /// Count `(added, removed)` lines in the raw hunk text.
    pub fn line_counts(&self) -> (usize, usize) {
        let Some(diff) = self.diff.as_deref() else {
            return (0, 0);
        };
        let mut added = 0;
        let mut removed = 0;
        // File headers (`---`/`+++`) only ever precede the first hunk.
        for line in diff.lines().skip_while(|l| !l.starts_with("@@")) {
            match DiffLineType::classify(line) {
                Some(DiffLineType::Added) => added += 1,
                Some(DiffLineType::Removed) => removed += 1,
                _ => {}
            }
        }
        (added, removed)
    }
}

/// Sort files by display path so anchor numbering is reproducible.
pub fn sort_for_annotation(files: &[DiffFile]) -> Vec<&DiffFile> {
    let mut sorted: Vec<&DiffFile> = files.iter().collect();
    sorted.sort_by(|a, b| a.display_path().cmp(b.display_path()));
    sorted
}
