//! GitLab discussion drafts.
//!
//! Renders each placed finding as the markdown body and line position a
//! merge request discussion would use. SHAs are filled in later by the
//! adopt flow from the latest MR version, so drafts carry only what the
//! review itself knows.

use crate::anchor::CitedFinding;
use crate::models::finding::{Finding, Severity};
use crate::output::OutputRenderer;

/// Renderer for discussion drafts, one per placed finding.
pub struct GitlabRenderer;

impl OutputRenderer for GitlabRenderer {
    fn render(&self, findings: &[CitedFinding]) -> String {
        let drafts: Vec<serde_json::Value> = findings
            .iter()
            .filter_map(|cited| {
                let position = cited.position.as_ref()?;
                let new_path = cited.new_path.as_deref().unwrap_or(&position.file_path);
                let old_path = cited.old_path.as_deref().unwrap_or(&position.file_path);
                let mut draft = serde_json::json!({
                    "body": comment_body(&cited.finding),
                    "new_path": new_path,
                    "old_path": old_path,
                });
                if let Some(anchor) = &cited.anchor_id {
                    draft["anchor_id"] = serde_json::json!(anchor);
                }
                if let Some(line) = position.new_line {
                    draft["new_line"] = serde_json::json!(line);
                } else if let Some(line) = position.old_line {
                    draft["old_line"] = serde_json::json!(line);
                }
                Some(draft)
            })
            .collect();

        serde_json::to_string_pretty(&drafts).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Markdown body for a discussion about `finding`.
pub fn comment_body(finding: &Finding) -> String {
    let marker = match finding.severity {
        Severity::Blocker => "🛑",
        Severity::High => "🔴",
        Severity::Medium => "🟡",
        Severity::Low => "🔵",
        Severity::Info | Severity::Unknown => "ℹ️",
    };

    let mut body = format!("{marker} **{}** ({})", finding.title, finding.severity);
    if let Some(category) = &finding.category {
        body.push_str(&format!(" · _{category}_"));
    }
    if !finding.description.is_empty() {
        body.push_str(&format!("\n\n{}", finding.description));
    }
    if let Some(evidence) = &finding.evidence {
        body.push_str(&format!("\n\n```\n{evidence}\n```"));
    }
    if let Some(remediation) = &finding.remediation {
        if let Some(steps) = &remediation.steps {
            body.push_str(&format!("\n\n**Suggestion:** {steps}"));
        }
        if let Some(diff) = &remediation.diff {
            body.push_str(&format!("\n\n```diff\n{diff}\n```"));
        }
    }
    body
}
