//! Review prompt assembly and report parsing.
//!
//! The prompt type is chosen from the change set, its guidance and output
//! contract become the system prompt, and the annotated diff is the user
//! message. A cross-file coherence prompt and a description prompt are
//! built the same way. Calling a model is left to the caller.

pub mod coherence;
pub mod describe;
pub mod report;
pub mod strategy;
pub mod templates;

use serde::Serialize;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::anchor::AnnotatedDiff;
use crate::config::PromptConfig;
use crate::models::diff::DiffFile;

pub use coherence::build_coherence_prompt;
pub use describe::{build_description_prompt, DescriptionPrompt};
pub use report::parse_report;
pub use strategy::{select_prompt_type, Selection};

/// Errors from report parsing.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("could not parse model response as a review report. Response: {0}")]
    Unparseable(String),
}

/// Which language-specific review guidance to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum PromptType {
    Generic,
    Java,
    Python,
    JavaScript,
}

impl PromptType {
    /// Every type, in tie-break order.
    pub const ALL: [PromptType; 4] = [
        PromptType::Generic,
        PromptType::Java,
        PromptType::Python,
        PromptType::JavaScript,
    ];
}

/// A ready-to-send review prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewPrompt {
    pub prompt_type: PromptType,
    pub system: String,
    /// The annotated diff.
    pub user: String,
}

/// Build the review prompt for `files`, whose annotation is `annotated`.
///
/// `prompt_type` overrides automatic selection.
pub fn build_review_prompt(
    files: &[DiffFile],
    annotated: &AnnotatedDiff,
    weights: &PromptConfig,
    prompt_type: Option<PromptType>,
) -> ReviewPrompt {
    let prompt_type = prompt_type.unwrap_or_else(|| select_prompt_type(files, weights).prompt_type);
    ReviewPrompt {
        prompt_type,
        system: templates::system_prompt(prompt_type),
        user: annotated.text.clone(),
    }
}
