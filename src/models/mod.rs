//! Shared types used across all modules.
//!
//! This module defines the core data structures for diffs, anchors,
//! positions, and model findings. Other modules import from here rather
//! than reaching into each other's internals.

pub mod anchor;
pub mod diff;
pub mod finding;

pub use anchor::{AnchorEntry, AnchorIndex, AnchorRef, LineDescriptor, ResolvedPosition, Side};
pub use diff::{DiffFile, DiffLineType};
pub use finding::{Finding, Report, Severity};

/// Legacy line type naming the new-file timeline.
pub const LINE_TYPE_NEW: &str = "new_line";

/// Legacy line type naming the old-file timeline.
pub const LINE_TYPE_OLD: &str = "old_line";
