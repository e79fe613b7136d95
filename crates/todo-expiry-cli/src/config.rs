//! Command-line and environment configuration.
//!
//! Every GitHub-specific option falls back to the variables a GitHub Actions
//! runner exports, so the binary needs no flags inside a workflow.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use clap::builder::FalseyValueParser;
use clap::{Parser, ValueEnum};
use todo_expiry_core::pipeline::DEFAULT_CONCURRENCY;
use todo_expiry_github::RepoContext;
use todo_expiry_github::issues::DEFAULT_LABEL;

/// Action inputs use the raw input name, hyphen included.
const TOKEN_INPUT_ENV: &str = "INPUT_GITHUB-TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(
    name = "todo-expiry",
    version,
    about = "Report TODO/FIXME comments and fail when their due date has passed"
)]
pub struct Config {
    /// Root of the git working tree to scan.
    #[arg(long, default_value = ".")]
    pub repo_root: PathBuf,

    /// Maximum concurrent `git blame` lookups.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Abort the run (as a failure) after this many seconds.
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    /// Evaluate expiry against this date instead of today's UTC date.
    #[arg(long, value_parser = parse_date)]
    pub today: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Append a markdown summary to this file.
    #[arg(long, env = "GITHUB_STEP_SUMMARY")]
    pub summary_file: Option<PathBuf>,

    /// Open a GitHub issue for every expired TODO.
    #[arg(long, env = "INPUT_CREATE-ISSUES", value_parser = FalseyValueParser::new())]
    pub create_issues: bool,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// `owner/name`.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Commit used for file links.
    #[arg(long, env = "GITHUB_SHA", default_value = "HEAD")]
    pub sha: String,

    #[arg(long, env = "GITHUB_SERVER_URL", default_value = "https://github.com")]
    pub server_url: String,

    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub api_url: String,

    /// Comma-separated labels for created issues.
    #[arg(long, env = "INPUT_ISSUE-LABELS", value_delimiter = ',', default_value = DEFAULT_LABEL)]
    pub issue_labels: Vec<String>,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `--github-token` / `GITHUB_TOKEN`, else the action input.
    pub fn token(&self) -> Option<String> {
        self.github_token
            .clone()
            .or_else(|| std::env::var(TOKEN_INPUT_ENV).ok())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn labels(&self) -> Vec<String> {
        self.issue_labels
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Link context, when a repository is configured.
    pub fn repo_context(&self) -> anyhow::Result<Option<RepoContext>> {
        let Some(repository) = self.repository.as_deref().filter(|r| !r.is_empty()) else {
            return Ok(None);
        };
        let context = RepoContext::new(&self.server_url, repository, &self.sha)
            .context("invalid --repository")?;
        Ok(Some(context))
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}
