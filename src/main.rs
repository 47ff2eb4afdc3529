//! Log Triage - command line entry point

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use log_triage::services::ingest::{ingest, parse_jsonl};
use log_triage::storage::ConfigService;
use log_triage::AppState;

#[derive(Debug, Parser)]
#[command(name = "log-triage", version, about = "Cache-first LLM analysis of error logs")]
struct Cli {
    /// Config file (defaults to ~/.log-triage/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a JSON-lines file of log entries into the store
    Ingest {
        /// Path to the .jsonl file
        file: PathBuf,
    },
    /// Analyze one log and print the outcome as JSON
    Analyze {
        #[arg(long)]
        project: String,
        #[arg(long)]
        log_id: String,
        /// Overall deadline in seconds (defaults to analyzer.request_timeout_secs)
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Print the effective configuration (API keys redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_service = match cli.config {
        Some(path) => ConfigService::load_or_create(path),
        None => ConfigService::new(),
    }
    .context("failed to load configuration")?;
    let config = config_service.effective_config();

    match cli.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        }
        Command::Ingest { file } => {
            let reader = BufReader::new(
                File::open(&file).with_context(|| format!("cannot open {}", file.display()))?,
            );
            let entries = parse_jsonl(reader)?;
            let state = AppState::from_config(config)?;
            let report = ingest(
                state.database().as_ref(),
                Some(state.embeddings().as_ref()),
                entries,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Analyze {
            project,
            log_id,
            timeout,
        } => {
            let state = AppState::from_config(config)?;
            let orchestrator = state.orchestrator();
            let outcome = match timeout {
                Some(secs) => {
                    orchestrator
                        .analyze_with_timeout(&project, &log_id, Duration::from_secs(secs))
                        .await
                }
                None => orchestrator.analyze(&project, &log_id).await,
            };
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if let Some(error) = outcome.error {
                anyhow::bail!(error);
            }
        }
    }

    Ok(())
}
