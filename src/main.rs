//! CLI entry point for the transfer indexer.
//!
//! ```text
//! main.rs (runtime + tracing)
//!     ↓
//! cli::run
//!     ├─ config        → environment
//!     ├─ db            → SQLite pool + schema
//!     ├─ rpc           → Alloy HTTP provider
//!     ├─ sync          → SyncEngine (one-shot or continuous)
//!     └─ api           → Read API (serve only)
//! ```

use transfer_indexer::{cli, observability};
use tracing::error;

/// Entry point for the transfer indexer.
///
/// Logging is controlled by `RUST_LOG`, `LOG_JSON` and `LOG_FILE`. Any
/// command error is logged and turns into exit status 1.
#[tokio::main]
async fn main() {
    // .env may carry the logging variables too
    dotenvy::dotenv().ok();

    let log_file = std::env::var("LOG_FILE").ok().map(std::path::PathBuf::from);
    let json_output = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    // Held until exit so buffered file logs are flushed
    let log_guard = match observability::init_tracing(None, log_file, json_output) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize tracing: {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = cli::run().await {
        error!(error = %format!("{e:#}"), "Application error");
        eprintln!("Error: {e:#}");
        drop(log_guard);
        std::process::exit(1);
    }
}
