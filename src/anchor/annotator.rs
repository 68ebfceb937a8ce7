//! Diff annotation: number every displayed line and build the anchor index.
//!
//! Output layout, per file in display-path order:
//!
//! ```text
//! --- File: src/lib.rs ---
//! @@ -10,3 +10,4 @@
//!  <<A#1|N|src/lib.rs|10>> let a = 1;
//! +<<A#2|N|src/lib.rs|11>> let b = 2;
//! -<<A#3|O|src/lib.rs|11>> let c = 2;
//! ...
//! ```

use std::convert::Infallible;
use std::fmt::Write as _;

use crate::models::anchor::{AnchorEntry, AnchorIndex};
use crate::models::diff::{sort_for_annotation, DiffFile, DiffLineType};

use super::counter::{parse_hunk_start, HunkCounter};
use super::marker::{anchor_id, format_marker};
use super::validator::canonical_side;
use super::AnchorError;

/// Text emitted when there is nothing to annotate.
pub const NO_DIFFS: &str = "(No diffs found)";

/// Separator written after every file block.
const FILE_SEPARATOR: &str = "...";

/// First sequence number handed out by [`annotate`].
pub const FIRST_ANCHOR: u64 = 1;

/// Annotation behaviour switches.
///
/// Resolving an anchor needs the same options that issued it, or the ids
/// will not line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotateOptions {
    /// Fail on a hunk header that cannot be numbered as written, instead
    /// of falling back.
    pub strict_hunk_headers: bool,
    /// Sequence number of the first anchor.
    pub first_anchor: u64,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            strict_hunk_headers: false,
            first_anchor: FIRST_ANCHOR,
        }
    }
}

/// Why a hunk was not numbered as its header says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// A start value did not parse; the hunk was numbered from line 1.
    UnparseableStart,
    /// The hunk ran past `u32::MAX`; its remaining lines carry no anchor.
    LineOverflow,
}

/// A hunk header that could not be numbered as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkFallback {
    pub path: String,
    pub header: String,
    pub reason: FallbackReason,
}

/// Result of one annotation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedDiff {
    /// Model-readable text with inline anchor markers.
    pub text: String,
    /// Anchor id to entry, in issue order.
    pub index: AnchorIndex,
    /// Sequence number the next anchor would receive.
    pub next_anchor: u64,
    /// Headers that fell back. Empty in strict mode.
    pub fallbacks: Vec<HunkFallback>,
}

/// Annotate `files` with the default (lenient) options, numbering from `A#1`.
pub fn annotate(files: &[DiffFile]) -> AnnotatedDiff {
    let lenient = |_: &DiffFile, _: &str| Ok::<(), Infallible>(());
    match annotate_files(files, FIRST_ANCHOR, lenient) {
        Ok(annotated) => annotated,
        Err(never) => match never {},
    }
}

/// Annotate `files` under `options`.
///
/// Files are sorted by display path first, so identical input always
/// yields identical ids and text.
pub fn annotate_with(files: &[DiffFile], options: &AnnotateOptions) -> Result<AnnotatedDiff, AnchorError> {
    let strict = options.strict_hunk_headers;
    annotate_files(files, options.first_anchor, |file: &DiffFile, header: &str| {
        if strict {
            Err(AnchorError::MalformedHunkHeader {
                path: file.display_path().to_string(),
                header: header.to_string(),
            })
        } else {
            Ok(())
        }
    })
}

/// Shared driver. `on_fallback` decides whether a hunk that cannot be
/// numbered as written aborts the pass.
fn annotate_files<E>(
    files: &[DiffFile],
    first_anchor: u64,
    mut on_fallback: impl FnMut(&DiffFile, &str) -> Result<(), E>,
) -> Result<AnnotatedDiff, E> {
    let mut out = AnnotatedDiff {
        text: String::new(),
        index: AnchorIndex::new(),
        next_anchor: first_anchor,
        fallbacks: Vec::new(),
    };

    if files.is_empty() {
        out.text.push_str(NO_DIFFS);
        return Ok(out);
    }

    let mut next = first_anchor;
    for file in sort_for_annotation(files) {
        let _ = writeln!(out.text, "--- File: {} ---", file.display_path());
        if let Some(diff) = file.diff.as_deref() {
            next = annotate_file(file, diff, next, &mut on_fallback, &mut out)?;
        }
        out.text.push_str(FILE_SEPARATOR);
        out.text.push('\n');
    }
    out.next_anchor = next;

    tracing::debug!(
        files = files.len(),
        anchors = out.index.len(),
        fallbacks = out.fallbacks.len(),
        "annotated diff"
    );

    Ok(out)
}

/// Annotate one file's hunks, returning the next unused sequence number.
fn annotate_file<E>(
    file: &DiffFile,
    diff: &str,
    mut next: u64,
    on_fallback: &mut impl FnMut(&DiffFile, &str) -> Result<(), E>,
    out: &mut AnnotatedDiff,
) -> Result<u64, E> {
    let new_path = file.effective_new_path();
    let old_path = file.effective_old_path();

    let mut counter: Option<HunkCounter> = None;
    let mut header = "";

    for raw in diff.lines() {
        if raw.starts_with("@@") {
            header = raw;
            counter = match parse_hunk_start(raw) {
                Some((start, fell_back)) => {
                    if fell_back {
                        on_fallback(file, raw)?;
                        tracing::warn!(
                            path = file.display_path(),
                            header = raw,
                            "unparseable hunk start, numbering from line 1"
                        );
                        out.fallbacks.push(HunkFallback {
                            path: file.display_path().to_string(),
                            header: raw.to_string(),
                            reason: FallbackReason::UnparseableStart,
                        });
                    }
                    Some(HunkCounter::new(start))
                }
                None => None,
            };
            push_line(out, raw);
            continue;
        }

        let Some(hunk) = counter.as_mut() else {
            push_line(out, raw);
            continue;
        };

        let Some(line_type) = DiffLineType::classify(raw) else {
            push_line(out, raw);
            continue;
        };

        let lines = match line_type {
            DiffLineType::Context => hunk
                .new_line()
                .zip(hunk.old_line())
                .map(|(new, old)| (Some(new), Some(old))),
            DiffLineType::Added => hunk.new_line().map(|new| (Some(new), None)),
            DiffLineType::Removed => hunk.old_line().map(|old| (None, Some(old))),
        };
        let Some((new_line, old_line)) = lines else {
            on_fallback(file, header)?;
            tracing::warn!(
                path = file.display_path(),
                header,
                "hunk runs past the largest line number, rest of hunk left unanchored"
            );
            out.fallbacks.push(HunkFallback {
                path: file.display_path().to_string(),
                header: header.to_string(),
                reason: FallbackReason::LineOverflow,
            });
            counter = None;
            push_line(out, raw);
            continue;
        };

        let id = anchor_id(next);
        next += 1;

        let side = canonical_side(line_type);
        let entry = AnchorEntry {
            id,
            side,
            new_path: new_path.to_string(),
            old_path: old_path.to_string(),
            new_line,
            old_line,
        };
        let (marker_path, marker_line) = entry.authoritative();
        // The authoritative line was checked above, so it is always set.
        let marker = format_marker(&entry.id, side, marker_path, marker_line.unwrap_or_default());

        out.text.push_str(&raw[..1]);
        out.text.push_str(&marker);
        out.text.push(' ');
        out.text.push_str(&raw[1..]);
        out.text.push('\n');

        out.index.insert(entry);
        hunk.advance(line_type);
    }

    Ok(next)
}

fn push_line(out: &mut AnnotatedDiff, raw: &str) {
    out.text.push_str(raw);
    out.text.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;
    use pretty_assertions::assert_eq;

    fn modified(path: &str, diff: &str) -> DiffFile {
        DiffFile {
            old_path: path.into(),
            new_path: path.into(),
            diff: Some(diff.into()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_input_yields_placeholder() {
        let out = annotate(&[]);
        assert_eq!(out.text, NO_DIFFS);
        assert!(out.index.is_empty());
        assert_eq!(out.next_anchor, FIRST_ANCHOR);
    }

    #[test]
    fn annotates_each_line_type() {
        let out = annotate(&[modified(
            "src/lib.rs",
            "@@ -10,3 +10,3 @@ fn f() {\n let a = 1;\n-let b = 2;\n+let b = 3;\n }\n",
        )]);

        let expected = "--- File: src/lib.rs ---\n\
@@ -10,3 +10,3 @@ fn f() {\n \
<<A#1|N|src/lib.rs|10>> let a = 1;\n\
-<<A#2|O|src/lib.rs|11>> let b = 2;\n\
+<<A#3|N|src/lib.rs|11>> let b = 3;\n \
<<A#4|N|src/lib.rs|12>> }\n\
...\n";
        assert_eq!(out.text, expected);

        let ctx = out.index.get("A#1").unwrap();
        assert_eq!(ctx.side, Side::New);
        assert_eq!((ctx.new_line, ctx.old_line), (Some(10), Some(10)));

        let removed = out.index.get("A#2").unwrap();
        assert_eq!(removed.side, Side::Old);
        assert_eq!((removed.new_line, removed.old_line), (None, Some(11)));

        let added = out.index.get("A#3").unwrap();
        assert_eq!((added.new_line, added.old_line), (Some(11), None));

        let last = out.index.get("A#4").unwrap();
        assert_eq!((last.new_line, last.old_line), (Some(12), Some(12)));
        assert_eq!(out.next_anchor, 5);
    }

    #[test]
    fn null_diff_emits_header_only() {
        let file = DiffFile {
            old_path: "old.bin".into(),
            new_path: "new.bin".into(),
            is_renamed: true,
            diff: None,
            ..Default::default()
        };
        let out = annotate(&[file]);
        assert_eq!(out.text, "--- File: new.bin ---\n...\n");
        assert!(out.index.is_empty());
    }

    #[test]
    fn metadata_before_first_hunk_passes_through() {
        let out = annotate(&[modified(
            "a.rs",
            "--- a/a.rs\n+++ b/a.rs\n@@ -1 +1 @@\n-x\n+y\n",
        )]);
        assert!(out.text.contains("--- a/a.rs\n+++ b/a.rs\n"));
        assert_eq!(out.index.len(), 2);
    }

    #[test]
    fn no_newline_marker_and_blank_lines_are_not_anchored() {
        let out = annotate(&[modified(
            "a.rs",
            "@@ -1,2 +1,2 @@\n-old\n\\ No newline at end of file\n\n+new\n",
        )]);
        assert_eq!(out.index.len(), 2);
        assert!(out.text.contains("\n\\ No newline at end of file\n\n+<<A#2|N|a.rs|1>> new\n"));
    }

    #[test]
    fn ids_continue_across_files_in_path_order() {
        let out = annotate(&[
            modified("z.rs", "@@ -1 +1 @@\n+z\n"),
            modified("a.rs", "@@ -1 +1 @@\n+a\n"),
        ]);
        assert_eq!(out.index.get("A#1").unwrap().new_path, "a.rs");
        assert_eq!(out.index.get("A#2").unwrap().new_path, "z.rs");
        assert!(out.text.find("a.rs").unwrap() < out.text.find("z.rs").unwrap());
    }

    #[test]
    fn numbering_starts_from_given_sequence() {
        let out = annotate_with(
            &[modified("a.rs", "@@ -1 +1 @@\n+a\n")],
            &AnnotateOptions {
                first_anchor: 41,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(out.index.get("A#41").is_some());
        assert_eq!(out.next_anchor, 42);
    }

    #[test]
    fn removed_marker_uses_old_path_on_rename() {
        let file = DiffFile {
            old_path: "old/name.rs".into(),
            new_path: "new/name.rs".into(),
            is_renamed: true,
            diff: Some("@@ -3 +3 @@\n-a\n+b\n".into()),
            ..Default::default()
        };
        let out = annotate(&[file]);
        assert!(out.text.contains("-<<A#1|O|old/name.rs|3>> a"));
        assert!(out.text.contains("+<<A#2|N|new/name.rs|3>> b"));
    }

    #[test]
    fn malformed_header_falls_back_and_is_reported() {
        let out = annotate(&[modified("a.rs", "@@ -x +y @@\n+first\n")]);
        assert_eq!(out.index.get("A#1").unwrap().new_line, Some(1));
        assert_eq!(out.fallbacks.len(), 1);
        assert_eq!(out.fallbacks[0].path, "a.rs");
        assert_eq!(out.fallbacks[0].reason, FallbackReason::UnparseableStart);
    }

    #[test]
    fn hunk_past_u32_max_stops_anchoring_without_panicking() {
        let files = [modified("big.rs", "@@ -4294967295 +4294967295 @@\n a\n b\n+c\n")];
        let out = annotate(&files);

        assert_eq!(out.index.len(), 1);
        let first = out.index.get("A#1").unwrap();
        assert_eq!(first.new_line, Some(u32::MAX));
        assert!(out.text.contains("\n b\n+c\n"));
        assert_eq!(out.fallbacks.len(), 1);
        assert_eq!(out.fallbacks[0].reason, FallbackReason::LineOverflow);

        let strict = annotate_with(
            &files,
            &AnnotateOptions {
                strict_hunk_headers: true,
                ..Default::default()
            },
        );
        assert!(matches!(strict, Err(AnchorError::MalformedHunkHeader { .. })));
    }

    #[test]
    fn last_line_at_u32_max_is_not_an_overflow() {
        let out = annotate(&[modified("big.rs", "@@ -1 +4294967295 @@\n+end\n")]);
        assert_eq!(out.index.get("A#1").unwrap().new_line, Some(u32::MAX));
        assert!(out.fallbacks.is_empty());
    }

    #[test]
    fn malformed_header_is_an_error_in_strict_mode() {
        let err = annotate_with(
            &[modified("a.rs", "@@ -x +y @@\n+first\n")],
            &AnnotateOptions {
                strict_hunk_headers: true,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, AnchorError::MalformedHunkHeader { .. }));
    }

    #[test]
    fn unrecognised_header_ends_the_hunk() {
        let out = annotate(&[modified("a.rs", "@@ -1 +1 @@\n+a\n@@ broken\n+b\n")]);
        assert_eq!(out.index.len(), 1);
        assert!(out.text.contains("@@ broken\n+b\n"));
    }
}
