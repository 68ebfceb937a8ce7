//! mrpin: anchored diffs and merge request line pinning.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use mrpin::adopt;
use mrpin::anchor;
use mrpin::config;
use mrpin::constants;
use mrpin::diff;
use mrpin::env;
use mrpin::gitlab;
use mrpin::output;
use mrpin::prompt;

use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;

use cli::args::{AdoptArgs, AnnotateArgs, Cli, Command, DiffArgs, PlaceArgs, PromptArgs, ResolveArgs};
use config::Config;
use env::Env;
use mrpin::models::DiffFile;
use mrpin::output::OutputRenderer;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let env = Env::real();
    cli::init_tracing(cli.verbose, &env);

    let work_dir = match cli.config_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let config = Config::load(Some(work_dir.as_path()), &env).context("failed to load configuration")?;

    match cli.command {
        Command::Annotate(args) => run_annotate(args, &config).await,
        Command::Resolve(args) => run_resolve(args, &config).await,
        Command::Place(args) => run_place(args, &config).await,
        Command::Prompt(args) => run_prompt(args, &config).await,
        Command::Adopt(args) => run_adopt(*args, &config).await,
        Command::Version => run_version(),
    }
}

/// Print version information.
fn run_version() -> Result<()> {
    use colored::Colorize;

    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    Ok(())
}

async fn load_files(args: &DiffArgs) -> Result<Vec<DiffFile>> {
    let input = diff::DiffInput::from_arg(&args.input);
    diff::load_diffs(&input, args.diff_format)
        .await
        .with_context(|| format!("failed to read diff from {}", args.input))
}

/// Annotate `files` under the options every command shares.
fn annotate(files: &[DiffFile], options: &anchor::AnnotateOptions) -> Result<anchor::AnnotatedDiff> {
    anchor::annotate_with(files, options).context("failed to annotate diff")
}

async fn load_report(path: &std::path::Path) -> Result<mrpin::models::Report> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    prompt::parse_report(&raw).context("failed to parse review report")
}

/// Annotate a diff and print the anchored text.
async fn run_annotate(args: AnnotateArgs, config: &Config) -> Result<()> {
    let files = load_files(&args.diff).await?;
    let annotated = annotate(&files, &args.annotate.options(&config.annotate))?;

    if let Some(path) = &args.index_out {
        let json = serde_json::to_string_pretty(&annotated.index)
            .context("failed to serialize anchor index")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    println!("{}", annotated.text);
    Ok(())
}

/// Resolve one reference and print the validated position.
async fn run_resolve(args: ResolveArgs, config: &Config) -> Result<()> {
    let reference = args
        .reference
        .to_reference()
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let files = load_files(&args.diff).await?;
    let annotated = annotate(&files, &args.annotate.options(&config.annotate))?;

    let resolved = anchor::resolve(&reference, &annotated.index, &files)?;
    let position = anchor::validate(resolved.position, resolved.file)?;
    let position = anchor::validator::single_sided(position);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&position)?);
    } else {
        println!("{}", output::terminal::format_position(&position));
    }
    Ok(())
}

/// Place every finding of a report and render the result.
async fn run_place(args: PlaceArgs, config: &Config) -> Result<()> {
    let files = load_files(&args.diff).await?;
    let report = load_report(&args.report).await?;

    let annotated = annotate(&files, &args.annotate.options(&config.annotate))?;
    let cited = anchor::place::cite_all(&report.findings, &annotated.index, &files);

    print!("{}", output::renderer(args.format).render(&cited));

    let unplaced = cited.iter().filter(|c| c.position.is_none()).count();
    if args.fail_on_unplaced && unplaced > 0 {
        bail!("{unplaced} finding(s) could not be placed on the current diff");
    }
    Ok(())
}

/// Print the review, coherence, or description prompt for a diff.
async fn run_prompt(args: PromptArgs, config: &Config) -> Result<()> {
    let files = load_files(&args.diff).await?;
    let annotated = annotate(&files, &args.annotate.options(&config.annotate))?;

    if args.describe {
        let description = prompt::build_description_prompt(&files, &annotated);
        return print_prompt(&description.system, &description.user, args.json, serde_json::json!({}));
    }

    if let Some(path) = &args.coherence {
        let report = load_report(path).await?;
        let coherence = prompt::build_coherence_prompt(&report.findings, &annotated);
        let extra = serde_json::json!({ "promptType": coherence.prompt_type });
        return print_prompt(&coherence.system, &coherence.user, args.json, extra);
    }

    let review = prompt::build_review_prompt(&files, &annotated, &config.prompt, args.prompt_type);
    let selection = prompt::select_prompt_type(&files, &config.prompt);
    let scores: serde_json::Map<String, serde_json::Value> = selection
        .scores
        .iter()
        .map(|(t, score)| (t.to_string(), serde_json::json!(score)))
        .collect();
    let extra = serde_json::json!({
        "promptType": review.prompt_type,
        "scores": scores,
    });
    print_prompt(&review.system, &review.user, args.json, extra)
}

/// Print a prompt as plain text, or as JSON with `extra` fields merged in.
fn print_prompt(system: &str, user: &str, json: bool, extra: serde_json::Value) -> Result<()> {
    if !json {
        println!("{system}\n\n{user}");
        return Ok(());
    }
    let mut out = serde_json::json!({ "system": system, "user": user });
    if let (Some(out), serde_json::Value::Object(extra)) = (out.as_object_mut(), extra) {
        out.extend(extra);
    }
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// Resolve a reference on a live merge request and post a discussion.
async fn run_adopt(args: AdoptArgs, config: &Config) -> Result<()> {
    args.validate_target().map_err(|e| anyhow::anyhow!("{e}"))?;
    let reference = args
        .reference
        .to_reference()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let mut gitlab_config = config.gitlab.clone();
    let mr = match (&args.mr_url, &args.project, args.iid) {
        (Some(url), _, _) => {
            let parsed = gitlab::parse_mr_url(url)?;
            gitlab_config.url = parsed.api_base();
            gitlab::MrRef::from(&parsed)
        }
        (None, Some(project), Some(iid)) => {
            if let Some(api_url) = &args.api_url {
                gitlab_config.url = api_url.clone();
            }
            gitlab::MrRef {
                project: project.clone(),
                iid,
            }
        }
        _ => bail!("a merge request is required: --mr-url, or --project with --iid"),
    };

    let body = match (&args.body, &args.body_file) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => bail!("a comment body is required: --body or --body-file"),
    };

    let client = gitlab::GitlabClient::from_config(&gitlab_config)?;
    let request = adopt::AdoptRequest {
        mr,
        reference,
        body,
        expected_head_sha: args.expected_sha,
        annotate: args.annotate.options(&config.annotate),
    };

    let outcome = if args.dry_run {
        adopt::prepare(&client, &request).await
    } else {
        adopt::adopt(&client, &client, &request).await
    }
    .with_context(|| format!("failed to adopt comment on {}", request.mr))?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
