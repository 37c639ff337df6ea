//! Command-line interface for the transfer indexer.
//!
//! # Commands
//!
//! - `sync`: run exactly one sync pass, then exit
//! - `serve`: continuous sync in the background plus the Read API
//! - `checkpoint`: show the stored checkpoint and how far behind it is
//! - `transfers`: print the most recent indexed transfers
//!
//! # Example
//!
//! ```bash
//! # One pass (cron-friendly; exit status reflects the outcome)
//! transfer-indexer sync
//!
//! # Long-running indexer + API on port 8080
//! transfer-indexer serve --port 8080
//! ```

use std::sync::Arc;

use alloy::primitives::U256;
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::eyre;
use tracing::{info, warn};

use crate::api::run_server;
use crate::app_state::AppState;
use crate::config::Config;
use crate::db::{create_pool, models::TransferRecord, repository::Repository};
use crate::error::IndexerResult;
use crate::rpc::{check_connection, create_provider, redact_rpc_url, AlloyLogSource};
use crate::sync::{
    safe_head, PassOutcome, SqliteCheckpointStore, SyncEngine, SyncMode, SyncSettings,
};

/// ERC-20 Transfer event indexer
#[derive(Parser, Debug)]
#[command(name = "transfer-indexer")]
#[command(about = "Checkpointed ERC-20 Transfer indexer with a read-only HTTP API", long_about = None)]
#[command(version)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one sync pass and exit
    #[command(alias = "indexer")]
    Sync,

    /// Sync continuously and serve the Read API
    Serve {
        /// Listen port (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show the stored checkpoint and the current safe head
    Checkpoint,

    /// Print the most recent indexed transfers
    Transfers {
        /// Number of transfers to show
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
}

/// Parse CLI arguments and execute the appropriate command.
///
/// # Errors
///
/// Returns an error if configuration, storage or the command itself fails.
pub async fn run() -> eyre::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync => run_sync_command().await,
        Commands::Serve { port } => run_serve_command(port).await,
        Commands::Checkpoint => run_checkpoint_command().await,
        Commands::Transfers { limit } => run_transfers_command(limit).await,
    }
}

/// Wire the sync engine to SQLite and the configured RPC endpoint.
async fn build_engine(config: &Config, repository: &Repository) -> IndexerResult<SyncEngine> {
    let provider = create_provider(config.rpc_url()).await?;
    let source = AlloyLogSource::new(provider, config.token_address());
    let checkpoints = SqliteCheckpointStore::new(repository.clone(), config.start_block());

    Ok(SyncEngine::new(
        Arc::new(source),
        Arc::new(checkpoints),
        Arc::new(repository.clone()),
        SyncSettings::from(config),
    ))
}

/// Execute one pass (one-shot mode).
async fn run_sync_command() -> eyre::Result<()> {
    let config = Config::from_env()?;
    info!(
        token = %config.token_address(),
        event = config.event_signature(),
        rpc_host = redact_rpc_url(config.rpc_url()),
        "Starting one-shot sync"
    );

    let repository = Repository::new(create_pool(config.database_url()).await?);
    let engine = build_engine(&config, &repository).await?;

    match engine.run(SyncMode::OneShot).await {
        Ok(outcome) => {
            print_outcome(&outcome);
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "Sync failed:".red().bold(), e);
            println!("{}", "Checkpoint unchanged; rerun to retry the same range.".yellow());
            Err(e.into())
        }
    }
}

/// Run the continuous engine and the Read API until Ctrl-C.
async fn run_serve_command(port: Option<u16>) -> eyre::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(port) = port {
        config = config.with_port(port);
    }

    let repository = Repository::new(create_pool(config.database_url()).await?);
    let engine = build_engine(&config, &repository).await?;

    println!(
        "{} token {} on port {}",
        "Indexing".cyan().bold(),
        config.token_address().to_checksum(None).yellow(),
        config.port().to_string().yellow()
    );

    let mut sync_task = tokio::spawn(async move { engine.run(SyncMode::Continuous).await });

    let state = AppState::new(repository);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    let server = run_server(
        state,
        config.port(),
        config.rate_limit_rpm(),
        config.cors_origins(),
        shutdown,
    );

    tokio::select! {
        result = server => {
            sync_task.abort();
            result?;
            println!("{}", "Shutdown complete".green().bold());
            Ok(())
        }
        joined = &mut sync_task => match joined {
            Ok(Err(e)) => Err(e.into()),
            Ok(Ok(_)) => Err(eyre!("Sync engine stopped unexpectedly")),
            Err(e) => Err(eyre!(e).wrap_err("Sync engine task panicked")),
        },
    }
}

/// Show where the next pass would start.
async fn run_checkpoint_command() -> eyre::Result<()> {
    let config = Config::from_env()?;
    let repository = Repository::new(create_pool(config.database_url()).await?);

    let (next_block, source) = match repository.get_checkpoint().await? {
        Some(block) => (block, "stored"),
        None => (config.start_block(), "START_BLOCK, nothing synced yet"),
    };
    println!(
        "{} {} ({})",
        "Next block:".cyan().bold(),
        next_block.to_string().yellow(),
        source.dimmed()
    );

    let provider = create_provider(config.rpc_url()).await?;
    match check_connection(&provider).await {
        Ok(head) => {
            let head = U256::from(head);
            println!("{} {}", "Chain head:".cyan().bold(), head);
            match safe_head(head, config.confirmation_blocks()) {
                Some(safe) if safe >= next_block => {
                    let behind = (safe - next_block).saturating_add(U256::from(1));
                    println!("{} {}", "Safe head: ".cyan().bold(), safe);
                    println!("{} {}", "Behind:    ".cyan().bold(), behind.to_string().yellow());
                }
                Some(safe) => {
                    println!("{} {}", "Safe head: ".cyan().bold(), safe);
                    println!("{}", "Up to date".green().bold());
                }
                None => println!("{}", "Chain shorter than the confirmation lag".yellow()),
            }
        }
        Err(e) => println!("{} {}", "Chain head unavailable:".red(), e),
    }

    Ok(())
}

/// Print the most recent transfers.
async fn run_transfers_command(limit: u32) -> eyre::Result<()> {
    let config = Config::from_env()?;
    let repository = Repository::new(create_pool(config.database_url()).await?);

    let transfers = repository.list_recent_transfers(limit.max(1), 0).await?;
    if transfers.is_empty() {
        println!("{}", "No transfers indexed yet.".yellow());
        return Ok(());
    }

    for transfer in &transfers {
        print_transfer(transfer);
    }
    println!(
        "{}",
        format!("{} of {} transfer(s)", transfers.len(), repository.count_transfers().await?)
            .dimmed()
    );

    Ok(())
}

fn print_outcome(outcome: &PassOutcome) {
    match outcome {
        PassOutcome::UpToDate { .. } => {
            println!("{} {}", "✓".green(), outcome.to_string().dimmed());
        }
        PassOutcome::Synced(summary) => {
            println!(
                "{} Blocks {} | {} batch(es) | {} fetched | {} new | {} skipped",
                "✓".green().bold(),
                summary.range.to_string().yellow(),
                summary.batches,
                summary.fetched,
                summary.inserted.to_string().green(),
                summary.skipped
            );
            println!(
                "{} {}",
                "Next block:".cyan(),
                summary.checkpoint.to_string().yellow()
            );
        }
    }
}

fn print_transfer(transfer: &TransferRecord) {
    println!(
        "{} {} {} → {} {}",
        transfer.block_number.yellow(),
        short(&transfer.tx_hash).dimmed(),
        short(&transfer.from_address).blue(),
        short(&transfer.to_address).magenta(),
        transfer.value.white().bold()
    );
}

/// Shorten a hex string to `0x1234…abcd` for terminal output.
fn short(hex: &str) -> String {
    if hex.len() <= 14 || !hex.is_ascii() {
        return hex.to_string();
    }
    format!("{}…{}", &hex[..6], &hex[hex.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        for args in [
            vec!["transfer-indexer", "sync"],
            vec!["transfer-indexer", "indexer"],
            vec!["transfer-indexer", "serve"],
            vec!["transfer-indexer", "checkpoint"],
            vec!["transfer-indexer", "transfers"],
        ] {
            assert!(Cli::try_parse_from(args.iter().copied()).is_ok(), "{args:?}");
        }
        assert!(Cli::try_parse_from(["transfer-indexer"]).is_err());
    }

    #[test]
    fn test_serve_port_override() {
        let cli = Cli::try_parse_from(["transfer-indexer", "serve", "--port", "8080"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: Some(8080) }));
    }

    #[test]
    fn test_transfers_limit() {
        let cli = Cli::try_parse_from(["transfer-indexer", "transfers", "-l", "5"]).unwrap();
        assert!(matches!(cli.command, Commands::Transfers { limit: 5 }));

        let cli = Cli::try_parse_from(["transfer-indexer", "transfers"]).unwrap();
        assert!(matches!(cli.command, Commands::Transfers { limit: 20 }));
    }

    #[test]
    fn test_short() {
        assert_eq!(
            short("0x1111111111111111111111111111111111111111"),
            "0x1111…1111"
        );
        assert_eq!(short("0xabc"), "0xabc");
    }
}
