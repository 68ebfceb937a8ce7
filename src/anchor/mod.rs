//! Addressable diff engine: annotate diffs with per-line anchors and
//! resolve anchors back to commentable file positions.
//!
//! The flow is two-phase and stateless. [`annotator::annotate`] numbers
//! every displayed line and yields the annotated text plus an
//! [`AnchorIndex`](crate::models::AnchorIndex). Later, [`resolver::resolve`]
//! looks an anchor up in an index rebuilt from the *current* diff and
//! [`validator::validate`] enforces which side of the file is addressable.

pub mod annotator;
pub mod counter;
pub mod marker;
pub mod place;
pub mod resolver;
pub mod validator;

use thiserror::Error;

pub use annotator::{annotate, annotate_with, AnnotateOptions, AnnotatedDiff, FallbackReason, HunkFallback};
pub use place::{place_finding, CitedFinding};
pub use resolver::{resolve, Resolved};
pub use validator::{canonical_side, validate};

/// Errors from annotation, resolution, and validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("anchor {anchor_id} not found in the current diff; the source has changed since it was annotated")]
    AnchorNotFound { anchor_id: String },

    #[error("no diff found for file: {path}")]
    FileNotInDiff { path: String },

    #[error("unsupported line type '{line_type}' (expected new_line or old_line)")]
    UnsupportedLineType { line_type: String },

    #[error("{reason}: {path} (new_file={is_new}, deleted_file={is_deleted})")]
    FileStateViolation {
        path: String,
        is_new: bool,
        is_deleted: bool,
        reason: &'static str,
    },

    #[error("finding has neither an anchor id nor a file location")]
    MissingLocation,

    #[error("malformed hunk header in {path}: {header}")]
    MalformedHunkHeader { path: String, header: String },
}
