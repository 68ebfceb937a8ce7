//! Merge request description prompt.

use serde::Serialize;

use crate::anchor::AnnotatedDiff;
use crate::models::diff::DiffFile;

use super::templates;

/// A ready-to-send description prompt. The model replies with Markdown,
/// not a report.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptionPrompt {
    pub system: String,
    pub user: String,
}

/// Build the description prompt for `files`.
///
/// The annotated diff is the user message. When it carries no anchors at
/// all, such as diffs without hunk headers, the raw diffs are sent under
/// a path banner instead.
pub fn build_description_prompt(files: &[DiffFile], annotated: &AnnotatedDiff) -> DescriptionPrompt {
    let user = if annotated.index.is_empty() {
        let plain = merge_plain(files);
        if plain.trim().is_empty() { annotated.text.clone() } else { plain }
    } else {
        annotated.text.clone()
    };

    DescriptionPrompt {
        system: templates::description_system_prompt().to_string(),
        user,
    }
}

fn merge_plain(files: &[DiffFile]) -> String {
    let mut out = String::new();
    for file in files {
        let path = file.display_path();
        if !path.is_empty() {
            out.push_str(&format!("===== {path} =====\n"));
        }
        if let Some(diff) = file.diff.as_deref().filter(|d| !d.trim().is_empty()) {
            out.push_str(diff);
            out.push_str("\n\n");
        }
    }
    out
}
