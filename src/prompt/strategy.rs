//! Weighted prompt-type selection.
//!
//! Each language strategy scores the change set by how many files and
//! changed lines fall under its extensions. The highest score wins; the
//! generic prompt keeps a tiny baseline so it wins whenever nothing else
//! matches.

use std::collections::HashMap;

use crate::config::PromptConfig;
use crate::models::diff::DiffFile;

use super::PromptType;

/// Baseline score of the generic strategy when there is at least one file.
const GENERIC_BASELINE: f64 = 0.01;

/// Per-extension change statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionStats {
    pub files: usize,
    pub added: usize,
    pub removed: usize,
}

/// Change statistics for a whole merge request, keyed by lowercased extension.
#[derive(Debug, Clone, Default)]
pub struct ChangeStats {
    by_extension: HashMap<String, ExtensionStats>,
    total_files: usize,
}

impl ChangeStats {
    pub fn from_files(files: &[DiffFile]) -> Self {
        let mut stats = Self::default();
        for file in files {
            let (added, removed) = file.line_counts();
            let entry = stats.by_extension.entry(file.extension()).or_default();
            entry.files += 1;
            entry.added += added;
            entry.removed += removed;
            stats.total_files += 1;
        }
        stats
    }

    pub fn get(&self, extension: &str) -> ExtensionStats {
        self.by_extension.get(extension).copied().unwrap_or_default()
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }
}

/// Extensions claimed by each language prompt.
pub fn extensions(prompt_type: PromptType) -> &'static [&'static str] {
    match prompt_type {
        PromptType::Java => &["java"],
        PromptType::Python => &["py"],
        PromptType::JavaScript => &["js", "jsx", "ts", "tsx", "mjs", "cjs"],
        PromptType::Generic => &[],
    }
}

/// Score one prompt type against `stats`.
pub fn score(prompt_type: PromptType, stats: &ChangeStats, weights: &PromptConfig) -> f64 {
    if prompt_type == PromptType::Generic {
        return if stats.total_files() > 0 { GENERIC_BASELINE } else { 0.0 };
    }
    extensions(prompt_type)
        .iter()
        .map(|ext| {
            let s = stats.get(ext);
            s.files as f64 * weights.file_count_weight + (s.added + s.removed) as f64 * weights.line_weight
        })
        .sum()
}

/// The chosen prompt type with every score, for logging and display.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub prompt_type: PromptType,
    pub scores: Vec<(PromptType, f64)>,
}

/// Pick the prompt type for `files`. Ties go to the earlier entry of
/// [`PromptType::ALL`], so the generic prompt wins an all-zero race.
pub fn select_prompt_type(files: &[DiffFile], weights: &PromptConfig) -> Selection {
    let stats = ChangeStats::from_files(files);
    let scores: Vec<(PromptType, f64)> = PromptType::ALL
        .iter()
        .map(|&t| (t, score(t, &stats, weights)))
        .collect();

    for (prompt_type, value) in &scores {
        tracing::debug!(prompt_type = %prompt_type, score = value, "prompt type score");
    }

    let prompt_type = scores
        .iter()
        .fold(None::<(PromptType, f64)>, |best, &(t, s)| match best {
            Some((_, best_score)) if s <= best_score => best,
            _ => Some((t, s)),
        })
        .map(|(t, _)| t)
        .unwrap_or(PromptType::Generic);

    tracing::info!(prompt_type = %prompt_type, "selected prompt type");
    Selection { prompt_type, scores }
}
