//! Parsing the model's review report.
//!
//! Models are told to answer with a single JSON object, but in practice the
//! object arrives wrapped in markdown fences or surrounded by prose. Several
//! candidate slices are tried in order until one deserializes.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::finding::{Finding, Report};

use super::ReportError;

/// Maximum number of response bytes quoted in a parse error.
const PARSE_ERROR_PREVIEW_LEN: usize = 500;

/// Content inside markdown code fences. The closing fence must start a line
/// so backticks inside JSON string values do not end the match.
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*\n(.*?)\n```").expect("fence regex is valid")
});

/// Parse a review report from raw model output.
///
/// Accepts a full report object, or a bare findings array (wrapped into a
/// report with no summary). An empty response is an empty report.
pub fn parse_report(response: &str) -> Result<Report, ReportError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Ok(Report::default());
    }

    for candidate in extract_json_candidates(trimmed) {
        if let Ok(report) = serde_json::from_str::<Report>(&candidate) {
            if looks_like_report(&candidate) {
                return Ok(report);
            }
        }
        if let Ok(findings) = serde_json::from_str::<Vec<Finding>>(&candidate) {
            return Ok(Report {
                findings,
                ..Default::default()
            });
        }
    }

    let preview_end = floor_char_boundary(response, PARSE_ERROR_PREVIEW_LEN);
    Err(ReportError::Unparseable(response[..preview_end].to_string()))
}

/// A JSON object with none of the report keys deserializes to an empty
/// report thanks to defaults; only accept objects that carry at least one.
fn looks_like_report(candidate: &str) -> bool {
    match serde_json::from_str::<serde_json::Value>(candidate) {
        Ok(serde_json::Value::Object(map)) => ["findings", "summaryMarkdown", "schemaVersion", "promptType"]
            .iter()
            .any(|key| map.contains_key(*key)),
        _ => false,
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

/// Candidate JSON slices of `text`, most literal first: the text itself,
/// the outermost `{...}` and `[...]` spans, then fenced blocks.
fn extract_json_candidates(text: &str) -> Vec<String> {
    let mut candidates = vec![text.to_string()];

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
            if start < end {
                candidates.push(text[start..=end].to_string());
            }
        }
    }

    for cap in FENCE_RE.captures_iter(text) {
        if let Some(inner) = cap.get(1) {
            let inner = inner.as_str().trim();
            if !inner.is_empty() {
                candidates.push(inner.to_string());
            }
        }
    }

    candidates
}
