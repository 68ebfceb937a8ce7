//! Clap argument types and reference validation.

use clap::{Args, Parser};
use std::path::PathBuf;

use mrpin::anchor::AnnotateOptions;
use mrpin::config::AnnotateConfig;
use mrpin::diff::DiffFormat;
use mrpin::models::{AnchorRef, LineDescriptor, LINE_TYPE_NEW};
use mrpin::output::OutputFormat;
use mrpin::prompt::PromptType;

/// Anchor diffs for model review and pin findings to merge request lines.
#[derive(Parser, Debug)]
#[command(name = "mrpin", version = mrpin::constants::VERSION)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Directory to read `.mrpin.toml` from (default: current directory).
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Annotate a diff with per-line anchors.
    Annotate(AnnotateArgs),

    /// Resolve an anchor or line citation against a diff.
    Resolve(ResolveArgs),

    /// Place every finding of a model report onto diff lines.
    Place(PlaceArgs),

    /// Build the review prompt for a diff.
    Prompt(PromptArgs),

    /// Pin a comment to a merge request line as a new discussion.
    Adopt(Box<AdoptArgs>),

    /// Print version information.
    Version,
}

/// Where the diff comes from and how to read it.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Diff file, or `-` for stdin.
    #[arg(default_value = "-")]
    pub input: String,

    /// Diff input format.
    #[arg(long = "diff-format", value_enum, default_value = "auto")]
    pub diff_format: DiffFormat,
}

/// Annotation switches shared by every command that numbers a diff.
///
/// Pass the same values to `annotate` and to whichever command later
/// reads the anchors back.
#[derive(Args, Debug, Default)]
pub struct AnnotateFlags {
    /// Fail on malformed hunk headers instead of numbering from line 1.
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Sequence number of the first anchor (default: config, else 1).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub start: Option<u64>,
}

impl AnnotateFlags {
    /// Layer these flags over the configured annotation settings.
    pub fn options(&self, config: &AnnotateConfig) -> AnnotateOptions {
        config.options(self.strict, self.start)
    }
}

/// A cited line: an anchor id, or a legacy `--file/--line` descriptor.
#[derive(Args, Debug)]
pub struct ReferenceArgs {
    /// Anchor id as issued by `annotate`, e.g. `A#12`.
    #[arg(long, conflicts_with_all = ["file", "line"])]
    pub anchor: Option<String>,

    /// File path for a legacy citation.
    #[arg(long, requires = "line")]
    pub file: Option<String>,

    /// Line number for a legacy citation.
    #[arg(long, requires = "file")]
    pub line: Option<u32>,

    /// `new_line` or `old_line` for a legacy citation.
    #[arg(long, default_value = LINE_TYPE_NEW)]
    pub line_type: String,
}

impl ReferenceArgs {
    /// Turn the flags into an anchor reference.
    pub fn to_reference(&self) -> Result<AnchorRef, String> {
        if let Some(anchor) = &self.anchor {
            return Ok(AnchorRef::Anchor(anchor.clone()));
        }
        match (&self.file, self.line) {
            (Some(file), Some(line)) => Ok(AnchorRef::Legacy(LineDescriptor {
                line_type: self.line_type.clone(),
                file_path: file.clone(),
                line,
            })),
            _ => Err("a line reference is required: --anchor, or --file with --line".to_string()),
        }
    }
}

/// Arguments for the `annotate` subcommand.
#[derive(Parser, Debug)]
pub struct AnnotateArgs {
    #[command(flatten)]
    pub diff: DiffArgs,

    #[command(flatten)]
    pub annotate: AnnotateFlags,

    /// Also write the anchor index as JSON to this path.
    #[arg(long)]
    pub index_out: Option<PathBuf>,
}

/// Arguments for the `resolve` subcommand.
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub diff: DiffArgs,

    #[command(flatten)]
    pub annotate: AnnotateFlags,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Print the position as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Arguments for the `place` subcommand.
#[derive(Parser, Debug)]
pub struct PlaceArgs {
    #[command(flatten)]
    pub diff: DiffArgs,

    #[command(flatten)]
    pub annotate: AnnotateFlags,

    /// Raw model response holding the review report.
    #[arg(long)]
    pub report: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value = "terminal")]
    pub format: OutputFormat,

    /// Exit non-zero when any finding could not be placed.
    #[arg(long, default_value_t = false)]
    pub fail_on_unplaced: bool,
}

/// Arguments for the `prompt` subcommand.
#[derive(Parser, Debug)]
pub struct PromptArgs {
    #[command(flatten)]
    pub diff: DiffArgs,

    #[command(flatten)]
    pub annotate: AnnotateFlags,

    /// Force a prompt type (GENERIC, JAVA, PYTHON, JAVASCRIPT).
    #[arg(long = "type", conflicts_with_all = ["coherence", "describe"])]
    pub prompt_type: Option<PromptType>,

    /// Build the cross-file coherence prompt from this review report.
    #[arg(long, value_name = "REPORT", conflicts_with = "describe")]
    pub coherence: Option<PathBuf>,

    /// Build the merge request description prompt.
    #[arg(long, default_value_t = false)]
    pub describe: bool,

    /// Print the prompt and selection scores as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Arguments for the `adopt` subcommand.
#[derive(Parser, Debug)]
pub struct AdoptArgs {
    /// Merge request web URL, e.g. https://gitlab.com/group/app/-/merge_requests/7.
    #[arg(long, conflicts_with_all = ["project", "iid"])]
    pub mr_url: Option<String>,

    /// Project path (`group/app`) or numeric id.
    #[arg(long, requires = "iid")]
    pub project: Option<String>,

    /// Merge request iid within the project.
    #[arg(long, requires = "project")]
    pub iid: Option<u64>,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    #[command(flatten)]
    pub annotate: AnnotateFlags,

    /// Markdown comment body.
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the comment body from a file.
    #[arg(long)]
    pub body_file: Option<PathBuf>,

    /// Refuse to post unless the latest version has this head SHA.
    #[arg(long)]
    pub expected_sha: Option<String>,

    /// Resolve and print the payload without posting.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// GitLab API base, overriding config (ignored with --mr-url).
    #[arg(long)]
    pub api_url: Option<String>,
}

impl AdoptArgs {
    /// Validate that exactly one merge request selector is provided.
    pub fn validate_target(&self) -> Result<(), String> {
        match (&self.mr_url, &self.project, self.iid) {
            (Some(_), None, None) | (None, Some(_), Some(_)) => Ok(()),
            _ => Err("a merge request is required: --mr-url, or --project with --iid".to_string()),
        }
    }
}
