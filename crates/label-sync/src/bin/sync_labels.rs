//! Sync GitHub labels from a source repository to a destination repository.
//!
//! Run `sync_labels --help` for usage information.

// CLI binaries legitimately need println! for user output
#![allow(clippy::disallowed_macros)]

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use dialoguer::Confirm;
use tracing::info;

use label_sync::config::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use label_sync::logging::{self, LogSettings, DEFAULT_LOG_FILE};
use label_sync::{GitHubLabels, PreparedSync, Reconciler, RepoRef, SyncConfig, SyncReport};

/// Exit status for fatal errors, including unusable arguments.
const EXIT_FATAL: u8 = 1;

/// Exit status when the plan was applied but some labels failed.
const EXIT_LABEL_FAILURES: u8 = 2;

#[derive(Parser)]
#[command(name = "sync_labels")]
#[command(about = "Synchronize labels idempotently between two GitHub repositories")]
#[command(version)]
struct Cli {
    /// Source GitHub repo for label sync process, in the form username/reponame or orgname/reponame
    #[arg(value_name = "source_repo")]
    source: RepoRef,

    /// Destination GitHub repo for label sync process, in the form username/reponame or orgname/reponame
    #[arg(value_name = "destination_repo")]
    destination: RepoRef,

    /// Do a dry run
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Delete labels that are in destination repo and not in source repo
    #[arg(short, long)]
    delete: bool,

    /// Perform label sync without waiting for user confirmation
    #[arg(short, long)]
    force: bool,

    /// GitHub API token
    #[arg(long, env = "GITHUB_API_KEY", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API base URL (for GitHub Enterprise)
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// File that receives a copy of the log
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Only log to the console
    #[arg(long)]
    no_log_file: bool,

    /// Output format: text, json
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Bare invocation prints usage and fails
    if std::env::args_os().len() == 1 {
        Cli::command().write_help(&mut std::io::stderr())?;
        return Ok(ExitCode::from(EXIT_FATAL));
    }

    // clap exits usage errors with 2, which is reserved for label failures
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            e.print()?;
            return Ok(ExitCode::from(EXIT_FATAL));
        }
    };

    let _log_guard = logging::init(&LogSettings {
        verbose: cli.verbose,
        log_file: (!cli.no_log_file).then(|| cli.log_file.clone()),
        console_stderr: matches!(cli.format, OutputFormat::Json),
    })?;

    let config = SyncConfig::from_token(cli.token.clone())?
        .with_api_url(&cli.api_url)?
        .with_timeout(Duration::from_secs(cli.timeout));
    let reconciler = Reconciler::new(GitHubLabels::new(&config)?);

    let prepared = reconciler
        .prepare(&cli.source, &cli.destination, cli.delete)
        .await?;

    if !cli.force && !cli.dry_run && !prepared.plan.is_empty() && !confirm(&prepared)? {
        println!("You safely aborted the label sync operation.");
        return Ok(ExitCode::SUCCESS);
    }

    let report = reconciler.apply(&prepared, cli.dry_run).await;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_LABEL_FAILURES))
    }
}

/// Ask before touching the destination.
fn confirm(prepared: &PreparedSync) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        anyhow::bail!(
            "Refusing to modify {} without confirmation on a non-interactive terminal (use --force)",
            prepared.destination
        );
    }

    info!(
        create = prepared.plan.to_create.len(),
        update = prepared.plan.to_update.len(),
        delete = prepared.plan.to_delete.len(),
        "Waiting for confirmation"
    );

    Confirm::new()
        .with_prompt("Okay to proceed?")
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

fn print_report(report: &SyncReport) {
    let heading = if report.dry_run {
        format!("Dry run: {} -> {}", report.source, report.destination)
    } else {
        format!("Synced {} -> {}", report.source, report.destination)
    };
    println!("\n{}", heading.bold());

    print_names("created", &report.created);
    print_names("updated", &report.updated);
    print_names("deleted", &report.deleted);
    println!(
        "  {} of {} label action(s) succeeded",
        report.succeeded(),
        report.succeeded() + report.fails.len()
    );

    if report.fails.is_empty() {
        println!("{}", "✅ All label actions succeeded".green());
    } else {
        println!(
            "{}",
            format!("❌ {} label action(s) failed:", report.fails.len()).red()
        );
        for fail in &report.fails {
            println!("  - {} {}: {}", fail.action, fail.name.bold(), fail.error);
        }
    }
}

fn print_names(verb: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    println!("  {} {}: {}", names.len(), verb, names.join(", "));
}
