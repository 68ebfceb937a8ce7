//! Cross-file coherence pass.
//!
//! A second prompt built from the first review's findings. The model sees
//! a severity summary per file and "bridge snippets": anchored lines of
//! the annotated diff that mention a token shared by findings in two or
//! more files. That is usually where one file's contract meets another's.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::anchor::marker::parse_marker;
use crate::anchor::resolver::lookup;
use crate::anchor::AnnotatedDiff;
use crate::models::finding::{Finding, Severity};

use super::{templates, PromptType, ReviewPrompt};

/// Findings listed under each file summary.
pub const MAX_FINDINGS_PER_FILE: usize = 5;

/// Shared tokens that get a bridge section.
pub const MAX_BRIDGE_TOKENS: usize = 5;

/// Anchored lines quoted per bridge token.
pub const MAX_LINES_PER_TOKEN: usize = 8;

const MIN_TOKEN_LEN: usize = 3;

/// Anything that cannot be part of an identifier or a path.
static TOKEN_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_./-]+").expect("token separator regex is valid"));

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "into", "that", "this", "have", "has", "should", "class",
    "public", "private", "protected", "static", "final", "const", "let", "var", "import",
    "package", "new", "old", "line", "lines", "path", "file",
];

/// Build the coherence prompt for `findings` over the diff in `annotated`.
///
/// Findings are grouped by their stated file, or by the path behind their
/// anchor when no file is given. Findings with neither are left out.
pub fn build_coherence_prompt(findings: &[Finding], annotated: &AnnotatedDiff) -> ReviewPrompt {
    let by_file = group_by_file(findings, annotated);
    let tokens = shared_tokens(&by_file);

    let mut user = file_summaries(&by_file);
    user.push('\n');
    user.push_str(&bridge_snippets(&tokens, &annotated.text));

    tracing::debug!(
        files = by_file.len(),
        tokens = tokens.len(),
        "built coherence prompt"
    );

    ReviewPrompt {
        prompt_type: PromptType::Generic,
        system: templates::coherence_system_prompt(),
        user,
    }
}

fn finding_file(finding: &Finding, annotated: &AnnotatedDiff) -> Option<String> {
    let location = finding.location.as_ref()?;
    if let Some(file) = location.file.as_deref().filter(|f| !f.is_empty()) {
        return Some(file.to_string());
    }
    let anchor = location.anchor_id.as_deref()?;
    let entry = lookup(anchor, &annotated.index).ok()?;
    Some(entry.authoritative().0.to_string())
}

fn group_by_file<'f>(findings: &'f [Finding], annotated: &AnnotatedDiff) -> BTreeMap<String, Vec<&'f Finding>> {
    let mut by_file: BTreeMap<String, Vec<&Finding>> = BTreeMap::new();
    for finding in findings {
        if let Some(file) = finding_file(finding, annotated) {
            by_file.entry(file).or_default().push(finding);
        }
    }
    by_file
}

/// `=== FILE SUMMARIES ===` section: counts per severity band, then the
/// most severe findings.
fn file_summaries(by_file: &BTreeMap<String, Vec<&Finding>>) -> String {
    let mut out = String::from("=== FILE SUMMARIES ===\n");
    for (file, findings) in by_file {
        let count = |pred: fn(Severity) -> bool| findings.iter().filter(|f| pred(f.severity)).count();
        let high = count(|s| matches!(s, Severity::Blocker | Severity::High));
        let medium = count(|s| s == Severity::Medium);
        let low = count(|s| matches!(s, Severity::Low | Severity::Info));
        let _ = writeln!(out, "- {file} | blocker+high/medium/low+info: {high}/{medium}/{low}");

        let mut ranked = findings.clone();
        ranked.sort_by_key(|f| f.severity.rank());
        for finding in ranked.into_iter().take(MAX_FINDINGS_PER_FILE) {
            let anchor = finding
                .location
                .as_ref()
                .and_then(|l| l.anchor_id.as_deref())
                .unwrap_or("?");
            let _ = writeln!(out, "  • [{}] {} @ {anchor}", finding.severity, finding.title);
        }
    }
    out
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    TOKEN_SEPARATOR_RE
        .split(text)
        .filter(|w| w.len() >= MIN_TOKEN_LEN)
        .filter(|w| !STOP_WORDS.contains(&w.to_lowercase().as_str()))
}

/// Tokens from finding titles and evidence that occur in at least two
/// files, most widely shared first.
fn shared_tokens(by_file: &BTreeMap<String, Vec<&Finding>>) -> Vec<String> {
    let mut files_by_token: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (file, findings) in by_file {
        for finding in findings {
            let texts = std::iter::once(finding.title.as_str()).chain(finding.evidence.as_deref());
            for token in texts.flat_map(tokens) {
                files_by_token.entry(token).or_default().insert(file.as_str());
            }
        }
    }

    let mut shared: Vec<(&str, usize)> = files_by_token
        .into_iter()
        .map(|(token, files)| (token, files.len()))
        .filter(|(_, count)| *count >= 2)
        .collect();
    // Stable, so equally shared tokens stay alphabetical.
    shared.sort_by(|a, b| b.1.cmp(&a.1));
    shared
        .into_iter()
        .take(MAX_BRIDGE_TOKENS)
        .map(|(token, _)| token.to_string())
        .collect()
}

/// `=== BRIDGE SNIPPETS ===` section: for each token, the anchored lines
/// of the annotated diff that mention it.
fn bridge_snippets(tokens: &[String], annotated_text: &str) -> String {
    let mut out = String::from("=== BRIDGE SNIPPETS (ANCHORS INCLUDED) ===\n");
    for token in tokens {
        let _ = writeln!(out, "-- token: {token} --");
        let lines = annotated_text
            .lines()
            .filter(|line| line.contains(token.as_str()) && parse_marker(line).is_some())
            .take(MAX_LINES_PER_TOKEN);
        for line in lines {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}
