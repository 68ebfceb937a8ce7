//! Terminal renderer: styled flowing text grouped by file.

use colored::Colorize;

use crate::anchor::CitedFinding;
use crate::models::anchor::{ResolvedPosition, Side};
use crate::models::finding::{Severity, Summary};
use crate::output::OutputRenderer;

/// Terminal output renderer with colored, flowing text.
pub struct TerminalRenderer;

impl OutputRenderer for TerminalRenderer {
    fn render(&self, findings: &[CitedFinding]) -> String {
        if findings.is_empty() {
            return format!("{}", "  ✔ No findings.\n".green());
        }

        let mut output = String::new();
        let mut sorted: Vec<&CitedFinding> = findings.iter().collect();
        sorted.sort_by(|a, b| {
            sort_path(a)
                .cmp(sort_path(b))
                .then(sort_line(a).cmp(&sort_line(b)))
                .then(a.finding.severity.rank().cmp(&b.finding.severity.rank()))
        });

        let mut current_file: Option<&str> = None;

        for cited in sorted {
            let path = sort_path(cited);
            if current_file.is_some_and(|f| f != path) {
                output.push('\n');
            }
            current_file = Some(path);

            let finding = &cited.finding;
            let location = match &cited.position {
                Some(position) => format_position(position).bold().to_string(),
                None => "(unplaced)".red().to_string(),
            };
            let anchor = cited
                .anchor_id
                .as_deref()
                .map(|a| format!(" [{a}]").dimmed().to_string())
                .unwrap_or_default();

            output.push_str(&format!(
                " {} {} in {}{}\n",
                severity_icon(finding.severity),
                severity_label(finding.severity),
                location,
                anchor
            ));
            output.push_str(&format!("   {}\n", finding.title.bold()));
            if !finding.description.is_empty() {
                output.push_str(&format!("   {}\n", finding.description));
            }
            if let Some(steps) = finding.remediation.as_ref().and_then(|r| r.steps.as_deref()) {
                output.push_str(&format!("   {} {}\n", "→".cyan(), steps));
            }
            if let Some(error) = &cited.error {
                output.push_str(&format!("   {} {}\n", "✖".red(), error.red()));
            }
            output.push('\n');
        }

        let summary = Summary::from_findings(findings.iter().map(|c| &c.finding));
        let unplaced = findings.iter().filter(|c| c.position.is_none()).count();
        output.push_str(&format!("{}\n", "───────────────────────────────────".dimmed()));
        output.push_str(&format!(
            " {} findings: {} blocker, {} high, {} medium, {} low, {} info",
            summary.total.to_string().bold(),
            summary.blocker.to_string().red().bold(),
            summary.high.to_string().red(),
            summary.medium.to_string().yellow(),
            summary.low.to_string().blue(),
            summary.info.to_string().dimmed(),
        ));
        if unplaced > 0 {
            output.push_str(&format!(", {} unplaced", unplaced.to_string().red().bold()));
        }
        output.push('\n');

        output
    }
}

/// `path:line (new)` / `path:line (old)`.
pub fn format_position(position: &ResolvedPosition) -> String {
    match (position.new_line, position.old_line) {
        (Some(new), Some(old)) => format!("{}:{new} (new, old {old})", position.file_path),
        (Some(new), None) => format!("{}:{new} ({})", position.file_path, Side::New),
        (None, Some(old)) => format!("{}:{old} ({})", position.file_path, Side::Old),
        (None, None) => position.file_path.clone(),
    }
}

fn sort_path(cited: &CitedFinding) -> &str {
    cited
        .position
        .as_ref()
        .map(|p| p.file_path.as_str())
        .or_else(|| cited.finding.location.as_ref().and_then(|l| l.file.as_deref()))
        .unwrap_or("")
}

fn sort_line(cited: &CitedFinding) -> u32 {
    cited
        .position
        .as_ref()
        .and_then(|p| p.new_line.or(p.old_line))
        .unwrap_or(0)
}

fn severity_icon(severity: Severity) -> String {
    match severity {
        Severity::Blocker | Severity::High => "✖".red().bold().to_string(),
        Severity::Medium => "⚠".yellow().bold().to_string(),
        Severity::Low | Severity::Info => "ℹ".blue().bold().to_string(),
        Severity::Unknown => "?".dimmed().to_string(),
    }
}

fn severity_label(severity: Severity) -> String {
    let label = severity.to_string();
    match severity {
        Severity::Blocker | Severity::High => label.red().bold().to_string(),
        Severity::Medium => label.yellow().bold().to_string(),
        Severity::Low | Severity::Info => label.blue().bold().to_string(),
        Severity::Unknown => label.dimmed().to_string(),
    }
}
