//! Anchor types: the per-line addresses issued during annotation and the
//! positions they resolve to.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Prefix shared by every anchor id (`A#1`, `A#2`, ...).
pub const ANCHOR_PREFIX: &str = "A#";

/// Which timeline of a file an addressed line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Post-change timeline: context and added lines.
    New,
    /// Pre-change timeline: removed lines.
    Old,
}

impl Side {
    /// Single-letter tag used inside anchor markers.
    pub fn tag(self) -> char {
        match self {
            Side::New => 'N',
            Side::Old => 'O',
        }
    }

    /// Parse a marker tag (`N`/`O`) or a spelled-out side (`new`/`old`).
    pub fn from_tag(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "n" | "new" | "new_line" => Some(Side::New),
            "o" | "old" | "old_line" => Some(Side::Old),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::New => write!(f, "new"),
            Side::Old => write!(f, "old"),
        }
    }
}

/// Metadata recorded for one issued anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorEntry {
    /// The anchor id, e.g. `A#17`.
    pub id: String,
    /// Authoritative side for this anchor.
    pub side: Side,
    pub new_path: String,
    pub old_path: String,
    /// Set for context and added lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line: Option<u32>,
    /// Set for context and removed lines. Informational only on `Side::New`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line: Option<u32>,
}

impl AnchorEntry {
    /// The path and line that are authoritative for this entry's side.
    pub fn authoritative(&self) -> (&str, Option<u32>) {
        match self.side {
            Side::New => (&self.new_path, self.new_line),
            Side::Old => (&self.old_path, self.old_line),
        }
    }
}

/// Ordered mapping from anchor id to entry for one diff snapshot.
///
/// Built fresh for every annotate or resolve call; never reuse one across
/// diff fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorIndex {
    entries: IndexMap<String, AnchorEntry>,
}

impl AnchorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry under its own id.
    pub fn insert(&mut self, entry: AnchorEntry) {
        self.entries.insert(entry.id.clone(), entry);
    }

    pub fn get(&self, id: &str) -> Option<&AnchorEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in issue order.
    pub fn iter(&self) -> impl Iterator<Item = &AnchorEntry> {
        self.entries.values()
    }
}

/// A concrete place to attach a review comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPosition {
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line: Option<u32>,
}

impl ResolvedPosition {
    /// A position on the new-file timeline.
    pub fn new_side(file_path: impl Into<String>, line: u32) -> Self {
        Self {
            file_path: file_path.into(),
            new_line: Some(line),
            old_line: None,
        }
    }

    /// A position on the old-file timeline.
    pub fn old_side(file_path: impl Into<String>, line: u32) -> Self {
        Self {
            file_path: file_path.into(),
            new_line: None,
            old_line: Some(line),
        }
    }
}

/// Legacy citation used when a finding carries no anchor id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDescriptor {
    /// `new_line` or `old_line`; anything else is rejected at resolve time.
    pub line_type: String,
    pub file_path: String,
    pub line: u32,
}

/// What the caller is asking to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorRef {
    /// An anchor id issued by a previous annotation pass.
    Anchor(String),
    /// A direct `(line_type, path, line)` citation.
    Legacy(LineDescriptor),
}
