//! CLI for the histofy deployment pipeline.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use histofy::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "histofy")]
#[command(author, version, about = "Paint your GitHub contribution graph with real commits", long_about = None)]
struct Cli {
    /// Path to the pending-change queue file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue dates at a contribution level for the next deployment
    Paint {
        /// Dates to paint (YYYY-MM-DD), comma- or space-separated
        #[arg(required = true)]
        dates: Vec<String>,

        /// Intensity level 0-4
        #[arg(short, long, default_value_t = 1)]
        level: u8,

        /// Destination repository as owner/name
        #[arg(short, long)]
        repo: Option<String>,
    },

    /// Show the pending queue
    Status,

    /// Deploy all pending changes
    Deploy {
        /// Destination repository override as owner/name
        #[arg(short, long)]
        repo: Option<String>,

        /// Branch that receives commits
        #[arg(short, long)]
        branch: Option<String>,

        /// Create the fallback repository as private
        #[arg(long)]
        private: bool,

        /// Dates per batch between ref updates
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Drop all pending changes
    Clear,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "histofy=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let store = JsonFileStore::new(store_path(cli.store)?);

    match cli.command {
        Commands::Paint { dates, level, repo } => cmd_paint(&store, dates, level, repo),
        Commands::Status => cmd_status(&store),
        Commands::Deploy {
            repo,
            branch,
            private,
            batch_size,
        } => cmd_deploy(&store, repo, branch, private, batch_size),
        Commands::Clear => {
            store.clear()?;
            println!("Pending queue cleared");
            Ok(())
        }
    }
}

fn store_path(override_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path);
    }
    let base = dirs::data_dir().context("could not determine a data directory for the queue")?;
    Ok(base.join("histofy").join("pending.json"))
}

fn cmd_paint(
    store: &JsonFileStore,
    raw_dates: Vec<String>,
    level: u8,
    repo: Option<String>,
) -> Result<()> {
    let level = ContributionLevel::from_level(level)
        .with_context(|| format!("level must be 0-4, got {level}"))?;

    let mut dates = BTreeMap::new();
    for chunk in raw_dates {
        for raw in chunk.split(',').filter(|s| !s.trim().is_empty()) {
            let date: NaiveDate = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))?;
            dates.insert(date, level);
        }
    }
    if dates.is_empty() {
        bail!("no dates given");
    }

    let target = repo.map(|r| RepoTarget::parse(&r)).transpose()?;
    let count = dates.len();
    store.add(PendingChange::date_selection(dates, target))?;
    println!("Queued {count} date(s) at level {}", level.level());
    Ok(())
}

fn cmd_status(store: &JsonFileStore) -> Result<()> {
    let changes = store.list_pending()?;
    if changes.is_empty() {
        println!("Pending queue is empty");
        return Ok(());
    }
    for change in &changes {
        match change.dates() {
            Some(dates) => {
                let target = match &change.kind {
                    ChangeKind::DateSelection {
                        target: Some(target),
                        ..
                    } => target.repo_key(),
                    _ => "(default)".into(),
                };
                println!("{}  {} date(s) -> {}", change.id, dates.len(), target);
            }
            None => println!("{}  (not deployable)", change.id),
        }
    }
    println!("{} pending change(s)", changes.len());
    Ok(())
}

fn cmd_deploy(
    store: &JsonFileStore,
    repo: Option<String>,
    branch: Option<String>,
    private: bool,
    batch_size: Option<usize>,
) -> Result<()> {
    let client = GitHubClient::from_env().context("authentication is required to deploy")?;

    let mut config = DeployConfig::default();
    if let Some(repo) = repo {
        config = config.with_target(&repo)?;
    }
    if let Some(branch) = branch {
        config = config.with_branch(branch);
    }
    if let Some(size) = batch_size {
        config = config.with_batch_size(size);
    }
    config.private_repo = private;

    let orchestrator = DeploymentOrchestrator::new(&client, config);
    let result = orchestrator
        .deploy(store, &TracingReporter, &CancellationToken::new())
        .map_err(|e| match e.guidance() {
            Some(hint) => anyhow::anyhow!("{e}\nhint: {hint}"),
            None => anyhow::anyhow!("{e}"),
        })?;

    for repo in &result.repos {
        println!(
            "{}: {} commits, {} failed dates{}",
            repo.target,
            repo.successful.len(),
            repo.failed.len(),
            if repo.ref_updated || repo.successful.is_empty() {
                ""
            } else {
                " (branch ref not updated)"
            }
        );
        for failure in &repo.failed {
            println!("  {}: {}", failure.date, failure.error);
        }
    }
    println!("{}", result.summary());

    if !result.is_complete_success() {
        bail!("deployment finished with failures; failed changes remain queued");
    }
    Ok(())
}
