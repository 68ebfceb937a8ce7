//! Finding types representing the model's structured review report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level of a finding, most severe first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Blocker,
    High,
    Medium,
    Low,
    Info,
    #[default]
    Unknown,
}

impl Severity {
    /// Sort rank; lower is more severe.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Blocker => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Info => 4,
            Severity::Unknown => 98,
        }
    }

    /// Normalise the vocabulary models tend to use.
    pub fn normalize(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "blocker" | "critical" | "fatal" => Severity::Blocker,
            "high" | "major" | "error" => Severity::High,
            "medium" | "med" | "moderate" | "warning" | "warn" => Severity::Medium,
            "low" | "minor" | "trivial" | "style" => Severity::Low,
            "info" | "information" | "informational" | "note" => Severity::Info,
            _ => Severity::Unknown,
        }
    }
}

/// Accepts any string; unrecognised values become [`Severity::Unknown`]
/// rather than failing the whole report.
impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Severity::normalize(&s))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Blocker => "blocker",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
            Severity::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Where in the diff a finding applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// `new_line` or `old_line`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    /// Anchor id copied verbatim from the annotated diff, e.g. `A#12`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_id: Option<String>,
    /// Side the model believed the anchor was on (`N`/`O`). Advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_side: Option<String>,
}

/// Suggested fix attached to a finding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remediation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<String>,
    /// Optional unified diff of the proposed change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

/// A single finding produced by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    /// correctness, performance, security, maintainability, style, docs, tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<Remediation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// The full structured report returned by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// JAVA, PYTHON, JAVASCRIPT or GENERIC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_type: Option<String>,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_markdown: Option<String>,
}

/// Summary statistics for a set of findings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub blocker: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub unknown: usize,
}

impl Summary {
    /// Compute summary from a list of findings.
    pub fn from_findings<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> Self {
        let mut s = Summary::default();
        for f in findings {
            s.total += 1;
            match f.severity {
                Severity::Blocker => s.blocker += 1,
                Severity::High => s.high += 1,
                Severity::Medium => s.medium += 1,
                Severity::Low => s.low += 1,
                Severity::Info => s.info += 1,
                Severity::Unknown => s.unknown += 1,
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_normalizes_llm_vocabulary() {
        assert_eq!(Severity::normalize("Critical"), Severity::Blocker);
        assert_eq!(Severity::normalize("major"), Severity::High);
        assert_eq!(Severity::normalize(" MED "), Severity::Medium);
        assert_eq!(Severity::normalize("minor"), Severity::Low);
        assert_eq!(Severity::normalize("informational"), Severity::Info);
        assert_eq!(Severity::normalize("whatever"), Severity::Unknown);
    }

    #[test]
    fn severity_rank_orders_most_severe_first() {
        assert!(Severity::Blocker.rank() < Severity::High.rank());
        assert!(Severity::Info.rank() < Severity::Unknown.rank());
    }

    #[test]
    fn finding_deserializes_camel_case() {
        let json = r#"{
            "severity": "high",
            "category": "correctness",
            "ruleId": "NPE",
            "title": "Null deref",
            "description": "x may be null",
            "location": {"file": "A.java", "lineType": "new_line", "startLine": 12, "anchorId": "A#4", "anchorSide": "N"},
            "remediation": {"steps": "check for null"},
            "confidence": 0.8,
            "tags": ["npe"]
        }"#;
        let f: Finding = serde_json::from_str(json).unwrap();
        assert_eq!(f.severity, Severity::High);
        assert_eq!(f.rule_id.as_deref(), Some("NPE"));
        let loc = f.location.unwrap();
        assert_eq!(loc.anchor_id.as_deref(), Some("A#4"));
        assert_eq!(loc.start_line, Some(12));
        assert_eq!(f.remediation.unwrap().steps.as_deref(), Some("check for null"));
    }

    #[test]
    fn missing_severity_is_unknown() {
        let f: Finding = serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert_eq!(f.severity, Severity::Unknown);
        assert!(f.location.is_none());
    }

    #[test]
    fn summary_counts_each_severity() {
        let make = |s| Finding {
            severity: s,
            ..Default::default()
        };
        let findings = vec![make(Severity::Blocker), make(Severity::Low), make(Severity::Low)];
        let s = Summary::from_findings(&findings);
        assert_eq!(s.total, 3);
        assert_eq!(s.blocker, 1);
        assert_eq!(s.low, 2);
        assert_eq!(s.info, 0);
    }
}
