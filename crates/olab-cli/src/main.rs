use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "olab-cli")]
#[command(about = "Regional labor observatory: posting ingest and salary imputation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ingest every enabled source once.
    Sync,
    /// Run ingests on the configured cron expressions until interrupted.
    Schedule,
    /// Recompute imputed salaries for all stored postings.
    Impute,
    /// Hash stored postings that predate dedup hashing and drop duplicates.
    BackfillDedup,
    /// Apply database migrations.
    Migrate,
    /// Summarize recent ingest runs.
    Report {
        #[arg(long, default_value_t = 5)]
        runs: usize,
        #[arg(long)]
        workspace_root: Option<PathBuf>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => {
            let summary = olab_sync::run_sync_once_from_env().await?;
            println!(
                "sync complete: run_id={} sources={} fetched={} inserted={} duplicates={} reports={}",
                summary.run_id,
                summary.enabled_sources,
                summary.fetched,
                summary.inserted,
                summary.duplicates,
                summary.reports_dir
            );
        }
        Commands::Schedule => {
            let pipeline = Arc::new(olab_sync::build_pipeline_from_env().await?);
            let Some(sched) = pipeline.maybe_build_scheduler().await? else {
                anyhow::bail!("scheduler disabled; set OLAB_SCHEDULER_ENABLED=1");
            };
            sched.start().await.context("starting scheduler")?;
            info!("scheduler running; press Ctrl-C to stop");
            tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
        }
        Commands::Impute => {
            let report = olab_sync::run_imputation_from_env().await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("serializing imputation report")?
            );
        }
        Commands::BackfillDedup => {
            let outcome = olab_sync::run_backfill_from_env().await?;
            println!(
                "dedup backfill complete: updated={} removed={}",
                outcome.updated, outcome.removed
            );
        }
        Commands::Migrate => {
            olab_sync::run_migrations_from_env().await?;
            println!("migrations applied");
        }
        Commands::Report {
            runs,
            workspace_root,
        } => {
            let root = workspace_root.unwrap_or_else(|| olab_sync::SyncConfig::from_env().workspace_root);
            println!("{}", olab_sync::report_recent_runs_markdown(runs, &root)?);
        }
    }

    Ok(())
}
