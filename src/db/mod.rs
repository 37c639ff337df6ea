//! Database module for persistent storage of transfers and the sync checkpoint.
//!
//! This module provides SQLite-based storage for:
//! - Decoded transfers, keyed by transaction hash
//! - The single "next block to sync" checkpoint
//!
//! # Architecture
//!
//! - `models`: Data structures that map to database tables
//! - `repository`: Queries for both tables
//! - Connection pooling with SQLite WAL mode so the read API can query
//!   while the sync engine writes

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::IndexerError;

pub mod models;
pub mod repository;

/// Tables the indexer cannot run without.
const REQUIRED_TABLES: [&str; 2] = ["checkpoint", "transfer"];

/// Creates a SQLite connection pool with optimized settings and an
/// up-to-date schema.
///
/// # Configuration
///
/// - **WAL mode**: Enables concurrent readers during writes
/// - **Busy timeout**: 30 seconds to handle lock contention
/// - **Max connections**: 5 (suitable for single-machine indexer), or a
///   single never-recycled connection for `sqlite::memory:` so the sync
///   engine and the read API share one database
/// - **Min connections**: 1 (keep one connection warm)
///
/// # Example
///
/// ```no_run
/// use transfer_indexer::db::create_pool;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool("sqlite:./indexer.db").await?;
///     // Use pool for queries
///     Ok(())
/// }
/// ```
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, IndexerError> {
    info!(database_url, "Connecting to database");

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| {
            IndexerError::database(
                format!("Failed to parse database URL: {database_url}"),
                Some(Box::new(e)),
            )
        })?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));

    // Each in-memory connection would otherwise be its own database
    let pool_options = if is_in_memory(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
        .map_err(|e| {
            IndexerError::database(
                format!("Failed to connect to database at {database_url}"),
                Some(Box::new(e)),
            )
        })?;

    info!("Applying database schema");
    run_migrations(&pool).await?;
    verify_database(&pool).await?;
    info!("Database schema ready");

    Ok(pool)
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Applies the embedded schema from the `migrations/` directory.
///
/// Safe to run any number of times; already-applied files are skipped.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), IndexerError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            IndexerError::database("Failed to apply database schema", Some(Box::new(e)))
        })?;

    Ok(())
}

/// Verify that required tables exist after migrations.
pub async fn verify_database(pool: &SqlitePool) -> Result<(), IndexerError> {
    let rows = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT name FROM sqlite_master
        WHERE type='table' AND name IN ('checkpoint', 'transfer')
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| IndexerError::database("Failed to verify database schema", Some(Box::new(e))))?;

    if rows.len() < REQUIRED_TABLES.len() {
        let found: Vec<String> = rows.into_iter().map(|(name,)| name).collect();
        return Err(IndexerError::database(
            format!(
                "Database schema incomplete. Expected tables {REQUIRED_TABLES:?}, found {found:?}"
            ),
            None,
        ));
    }

    Ok(())
}
