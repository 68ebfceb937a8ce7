//! JSON output renderer.
//!
//! Outputs `{"findings": [...], "summary": {...}, "unplaced": n}`.

use crate::anchor::CitedFinding;
use crate::models::finding::Summary;
use crate::output::OutputRenderer;

/// JSON output renderer.
pub struct JsonRenderer;

impl OutputRenderer for JsonRenderer {
    fn render(&self, findings: &[CitedFinding]) -> String {
        let summary = Summary::from_findings(findings.iter().map(|c| &c.finding));
        let unplaced = findings.iter().filter(|c| c.position.is_none()).count();

        let output = serde_json::json!({
            "findings": findings,
            "summary": summary,
            "unplaced": unplaced,
        });

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }
}
