//! Output renderers: terminal, JSON, and GitLab discussion drafts.

pub mod gitlab;
pub mod json;
pub mod terminal;

use crate::anchor::CitedFinding;

/// Trait for rendering placed findings to an output format.
pub trait OutputRenderer {
    /// Render findings to a string.
    fn render(&self, findings: &[CitedFinding]) -> String;
}

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
    Gitlab,
}

/// Renderer for `format`.
pub fn renderer(format: OutputFormat) -> Box<dyn OutputRenderer> {
    match format {
        OutputFormat::Terminal => Box::new(terminal::TerminalRenderer),
        OutputFormat::Json => Box::new(json::JsonRenderer),
        OutputFormat::Gitlab => Box::new(gitlab::GitlabRenderer),
    }
}
