//! Inline anchor markers: `<<A#<n>|<N|O>|<path>|<line>>>`.
//!
//! The model is told to copy ids verbatim, so the shape here must not drift.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::anchor::{ANCHOR_PREFIX, Side};

/// Matches a full marker. The path may contain `|`, so it runs up to the
/// first `|<digits>>>` rather than the first `|`.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<<(A#\d+)\|([NO])\|(.*?)\|(\d+)>>").expect("marker regex is valid")
});

/// Matches a bare anchor id anywhere in a string.
static ANCHOR_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"A#(\d+)").expect("anchor id regex is valid"));

/// The fields carried by one marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub anchor_id: String,
    pub side: Side,
    pub path: String,
    pub line: u32,
}

/// Anchor id for sequence number `n`.
pub fn anchor_id(n: u64) -> String {
    format!("{ANCHOR_PREFIX}{n}")
}

/// Render a marker.
pub fn format_marker(anchor_id: &str, side: Side, path: &str, line: u32) -> String {
    format!("<<{anchor_id}|{}|{path}|{line}>>", side.tag())
}

/// Find the first marker in an annotated line.
pub fn parse_marker(line: &str) -> Option<Marker> {
    let caps = MARKER_RE.captures(line)?;
    let side = Side::from_tag(&caps[2])?;
    let line_no = caps[4].parse().ok()?;
    Some(Marker {
        anchor_id: caps[1].to_string(),
        side,
        path: caps[3].to_string(),
        line: line_no,
    })
}

/// Canonicalise an anchor id as cited by the model.
///
/// Accepts `A#12`, ` A#12 `, or a whole copied marker such as
/// `<<A#12|N|src/a.rs|4>>`. Returns `None` when no id is present.
pub fn normalize_anchor_id(raw: &str) -> Option<String> {
    let caps = ANCHOR_ID_RE.captures(raw.trim())?;
    let n: u64 = caps[1].parse().ok()?;
    Some(anchor_id(n))
}
