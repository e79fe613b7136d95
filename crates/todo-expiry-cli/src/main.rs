mod config;
mod report;
mod scan;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use todo_expiry_core::Pipeline;
use todo_expiry_git::GitRepo;
use todo_expiry_github::{GithubClient, IssueCreator, RepoContext};
use tracing::{Level, error, info, warn};

use crate::config::{Config, OutputFormat};
use crate::scan::ScanStats;

/// Exit status when at least one TODO is past its due date.
const EXIT_EXPIRED: u8 = 1;
/// Exit status when the run itself failed.
const EXIT_FATAL: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    init_tracing(config.verbose);
    info!("todo-expiry v{}", env!("CARGO_PKG_VERSION"));

    match run(&config).await {
        Ok(stats) if stats.has_expired() => {
            error!(expired = stats.expired_count(), "Some TODOs are expired!");
            ExitCode::from(EXIT_EXPIRED)
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(config: &Config) -> anyhow::Result<ScanStats> {
    let context = config.repo_context()?;
    let repo = GitRepo::open(&config.repo_root).context("opening repository")?;

    let mut pipeline = Pipeline::new()
        .with_concurrency(config.concurrency)
        .with_deadline(config.timeout());
    if let Some(today) = config.today {
        pipeline = pipeline.with_today(today);
    }

    let stats = scan::run_scan(&repo, &pipeline)
        .await
        .context("scanning TODO comments")?;
    info!(
        findings = stats.findings.len(),
        expired = stats.expired_count(),
        elapsed_secs = stats.elapsed_secs,
        today = %pipeline.today(),
        "scan complete"
    );

    publish(config, context.as_ref(), &stats)?;

    if config.create_issues {
        create_issues(config, context.as_ref(), &stats).await?;
    }

    Ok(stats)
}

fn publish(config: &Config, context: Option<&RepoContext>, stats: &ScanStats) -> anyhow::Result<()> {
    match config.format {
        OutputFormat::Text => print!("{}", report::render_table(&stats.findings)),
        OutputFormat::Json => println!("{}", report::render_json(&stats.findings)?),
        OutputFormat::Markdown => print!("{}", report::render_markdown(&stats.findings, context)),
    }

    if let Some(path) = &config.summary_file {
        report::append_summary(path, &report::render_markdown(&stats.findings, context))?;
        info!(path = %path.display(), "wrote job summary");
    }
    Ok(())
}

async fn create_issues(
    config: &Config,
    context: Option<&RepoContext>,
    stats: &ScanStats,
) -> anyhow::Result<()> {
    let Some(token) = config.token() else {
        warn!("github-token is required to create issues");
        return Ok(());
    };
    let Some(context) = context else {
        warn!("--repository (GITHUB_REPOSITORY) is required to create issues");
        return Ok(());
    };

    let client = GithubClient::new(config.api_url.clone(), token, context)
        .context("building GitHub client")?;
    let summary = IssueCreator::new(&client, context, config.labels())
        .create_for_expired(&stats.findings)
        .await;
    info!(
        created = summary.created,
        skipped = summary.skipped,
        failed = summary.failed,
        "issue creation complete"
    );
    Ok(())
}
