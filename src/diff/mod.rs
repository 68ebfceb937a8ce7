//! Diff loading: GitLab `/diffs` JSON payloads and raw `git diff` output.

pub mod file;
pub mod parser;

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::models::diff::DiffFile;

/// Errors from the diff loader.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("failed to read diff input: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("invalid diff JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where diff input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffInput {
    File(PathBuf),
    Stdin,
}

impl DiffInput {
    /// `-` means stdin, anything else is a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            DiffInput::Stdin
        } else {
            DiffInput::File(PathBuf::from(arg))
        }
    }
}

/// How to interpret diff input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DiffFormat {
    /// JSON when the input starts with `[` or `{`, unified diff otherwise.
    #[default]
    Auto,
    /// An array of GitLab diff entries, or an object with `changes`/`diffs`.
    Json,
    /// Raw `git diff` output.
    Unified,
}

/// GitLab returns bare arrays from `/diffs` and wrapped ones from `/changes`.
#[derive(Deserialize)]
#[serde(untagged)]
enum DiffPayload {
    Files(Vec<DiffFile>),
    Changes { changes: Vec<DiffFile> },
    Diffs { diffs: Vec<DiffFile> },
}

/// Parse diff input text into files.
pub fn parse_diffs(content: &str, format: DiffFormat) -> Result<Vec<DiffFile>, DiffError> {
    let json = match format {
        DiffFormat::Json => true,
        DiffFormat::Unified => false,
        DiffFormat::Auto => {
            let trimmed = content.trim_start();
            trimmed.starts_with('[') || trimmed.starts_with('{')
        }
    };

    let files = if json {
        match serde_json::from_str::<DiffPayload>(content)? {
            DiffPayload::Files(files)
            | DiffPayload::Changes { changes: files }
            | DiffPayload::Diffs { diffs: files } => files,
        }
    } else {
        parser::split_unified_diff(content)
    };

    tracing::debug!(files = files.len(), json, "loaded diff input");
    Ok(files)
}

/// Read and parse diff input.
pub async fn load_diffs(input: &DiffInput, format: DiffFormat) -> Result<Vec<DiffFile>, DiffError> {
    let content = match input {
        DiffInput::File(path) => file::read_diff_file(path).await?,
        DiffInput::Stdin => file::read_diff_stdin().await?,
    };
    parse_diffs(&content, format)
}
