//! SDP CLI - workstream orchestrator

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;

use sdp::checkpoint::{CheckpointStatus, CheckpointStore, FileCheckpointStore};
use sdp::error::{FixSuggestion, SdpError};
use sdp::runtime::{FeatureCoordinator, Orchestrator, ProgressStatus, ProgressUpdate};
use sdp::slo::SloTracker;
use sdp::workstream::{CommandExecutor, DirectorySource};
use sdp::SdpConfig;

#[derive(Parser)]
#[command(name = "sdp")]
#[command(about = "SDP - workstream orchestrator for multi-step features")]
#[command(version)]
struct Cli {
    /// Directory holding checkpoint files
    #[arg(long, global = true)]
    checkpoint_dir: Option<PathBuf>,

    /// Directory holding workstream markdown files
    #[arg(long, global = true)]
    workstream_dir: Option<PathBuf>,

    /// Retries per workstream after the first attempt
    #[arg(long, global = true)]
    retry: Option<u32>,

    /// Command run for each workstream as `<executor> <args...> <ws_id>`
    #[arg(long, global = true)]
    executor: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute every workstream of a feature
    Run {
        /// Feature id (e.g. F01)
        feature: String,

        /// Print SLO status after the run
        #[arg(long)]
        slo: bool,
    },

    /// Continue a feature from its checkpoint
    Resume {
        /// Checkpoint id (the feature id for checkpoints written by `run`)
        checkpoint_id: String,

        /// Print SLO status after the run
        #[arg(long)]
        slo: bool,
    },

    /// Print the execution order without running anything
    Plan {
        /// Feature id
        feature: String,
    },

    /// Manage checkpoints
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },
}

#[derive(Subcommand)]
enum CheckpointAction {
    /// List checkpoints, newest first
    List,

    /// Show one checkpoint as JSON
    Show {
        /// Checkpoint id
        id: String,
    },

    /// Delete completed checkpoints older than the given age
    Clean {
        #[arg(long, default_value = "168")]
        older_than_hours: u64,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match resolve_config(&cli) {
        Ok(config) => dispatch(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

/// Config file, then `SDP_*` env, then CLI flags
fn resolve_config(cli: &Cli) -> Result<SdpConfig, SdpError> {
    let mut config = SdpConfig::load()?.with_env()?;

    if let Some(dir) = &cli.checkpoint_dir {
        config.paths.checkpoint_dir = dir.clone();
    }
    if let Some(dir) = &cli.workstream_dir {
        config.paths.workstream_dir = dir.clone();
    }
    if let Some(retries) = cli.retry {
        config.orchestrator.max_retries = retries;
    }
    if let Some(executor) = &cli.executor {
        config.executor.command = executor.clone();
    }

    Ok(config)
}

async fn dispatch(command: Commands, config: SdpConfig) -> Result<(), SdpError> {
    match command {
        Commands::Run { feature, slo } => run_feature(&config, &feature, slo).await,
        Commands::Resume { checkpoint_id, slo } => {
            resume_feature(&config, &checkpoint_id, slo).await
        }
        Commands::Plan { feature } => plan_feature(&config, &feature).await,
        Commands::Checkpoint { action } => handle_checkpoint_command(&config, action).await,
    }
}

fn build_orchestrator(config: &SdpConfig, slo: Option<Arc<SloTracker>>) -> Orchestrator {
    let source = Arc::new(DirectorySource::new(&config.paths.workstream_dir));
    let executor = Arc::new(CommandExecutor::new(
        config.executor.command.clone(),
        config.executor.args.clone(),
    ));
    let store = Arc::new(FileCheckpointStore::new(&config.paths.checkpoint_dir));

    let orchestrator = Orchestrator::new(source, executor, store, config.orchestrator.max_retries);
    match slo {
        Some(tracker) => orchestrator.with_slo_tracker(tracker),
        None => orchestrator,
    }
}

fn print_progress(update: ProgressUpdate) {
    let line = match update.status {
        ProgressStatus::Completed | ProgressStatus::FeatureCompleted => {
            update.message.green().to_string()
        }
        ProgressStatus::Retrying => update.message.yellow().to_string(),
        ProgressStatus::Failed | ProgressStatus::FeatureFailed => update.message.red().to_string(),
        _ => update.message,
    };
    println!("{line}");
}

fn coordinator(config: &SdpConfig, slo: Option<Arc<SloTracker>>) -> FeatureCoordinator {
    FeatureCoordinator::new(build_orchestrator(config, slo), print_progress)
        .with_retry_policy(config.retry_policy())
}

fn print_slo(tracker: Option<&Arc<SloTracker>>) {
    if let Some(tracker) = tracker {
        println!("\n{}", "SLO status:".cyan().bold());
        println!("{}", tracker.status());
    }
}

async fn run_feature(config: &SdpConfig, feature: &str, slo: bool) -> Result<(), SdpError> {
    let tracker = slo.then(|| Arc::new(SloTracker::new()));
    let coordinator = coordinator(config, tracker.clone());

    let result = coordinator.execute_feature(feature).await;
    print_slo(tracker.as_ref());

    let checkpoint = result?;
    println!(
        "{} Feature '{}' complete (checkpoint: {})",
        "✓".green(),
        feature,
        checkpoint.id
    );
    Ok(())
}

async fn resume_feature(
    config: &SdpConfig,
    checkpoint_id: &str,
    slo: bool,
) -> Result<(), SdpError> {
    let tracker = slo.then(|| Arc::new(SloTracker::new()));
    let coordinator = coordinator(config, tracker.clone());

    let result = coordinator.resume_feature(checkpoint_id).await;
    print_slo(tracker.as_ref());

    let checkpoint = result?;
    println!(
        "{} Feature '{}' complete ({} workstreams)",
        "✓".green(),
        checkpoint.feature_id,
        checkpoint.completed_workstreams.len()
    );
    Ok(())
}

async fn plan_feature(config: &SdpConfig, feature: &str) -> Result<(), SdpError> {
    let order = build_orchestrator(config, None).plan(feature).await?;

    println!("Execution order for {} ({} workstreams):", feature.cyan(), order.len());
    for (i, ws_id) in order.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, ws_id);
    }
    Ok(())
}

async fn handle_checkpoint_command(
    config: &SdpConfig,
    action: CheckpointAction,
) -> Result<(), SdpError> {
    let store = FileCheckpointStore::new(&config.paths.checkpoint_dir);

    match action {
        CheckpointAction::List => {
            let checkpoints = store.list().await?;
            println!("Found {} checkpoints:\n", checkpoints.len());
            println!(
                "{:<24} {:<12} {:>9} {:>20}",
                "ID", "STATUS", "COMPLETED", "UPDATED"
            );
            println!("{}", "-".repeat(68));

            for cp in checkpoints {
                let status = match cp.status {
                    CheckpointStatus::Completed => cp.status.as_str().green(),
                    CheckpointStatus::Failed => cp.status.as_str().red(),
                    _ => cp.status.as_str().yellow(),
                };
                println!(
                    "{:<24} {:<12} {:>9} {:>20}",
                    cp.id,
                    status,
                    cp.completed_workstreams.len(),
                    cp.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
            Ok(())
        }

        CheckpointAction::Show { id } => {
            let checkpoint = store.load(&id).await?;
            println!("{}", serde_json::to_string_pretty(&checkpoint)?);
            Ok(())
        }

        CheckpointAction::Clean { older_than_hours } => {
            let age = Duration::from_secs(older_than_hours.saturating_mul(3600));
            let removed = store.clean(age).await?;
            println!(
                "Deleted {} completed checkpoints older than {}h",
                removed, older_than_hours
            );
            Ok(())
        }
    }
}
