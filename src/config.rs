//! Configuration management for the transfer indexer.
//!
//! This module handles loading and validating configuration from environment variables
//! using the `dotenvy` crate. All operations return [`IndexerResult`] and a missing
//! required setting is reported as [`IndexerError::ConfigError`].
//!
//! ## Environment Variables
//!
//! Required:
//! - `RPC_URL`: HTTP(S) JSON-RPC endpoint
//! - `TOKEN_ADDRESS`: contract whose events are indexed
//! - `START_BLOCK`: first block to index when no checkpoint exists
//!
//! Optional (with defaults):
//! - `EVENT_SIGNATURE`: event to index, as a signature or an ABI fragment
//!   (default: `Transfer(address,address,uint256)`)
//! - `CONFIRMATION_BLOCKS`: trailing blocks treated as not yet final (default: 12)
//! - `BATCH_SIZE`: block span of one `eth_getLogs` request (default: 1000)
//! - `BATCH_DELAY_MS`: fixed pause between batches (default: 2000)
//! - `POLL_INTERVAL_SECS`: pause between passes in continuous mode (default: 12)
//! - `RETRY_BACKOFF_SECS`: pause after any failure (default: 5)
//! - `MAX_BATCH_RETRIES`: extra attempts per batch (default: 3)
//! - `DATABASE_URL`: SQLite connection string (default: `sqlite:./indexer.db`)
//! - `PORT`: read API port (default: 3000)
//! - `RATE_LIMIT_RPM`: read API requests per minute (default: 600)
//! - `CORS_ORIGINS`: comma-separated allowed origins (default: `*`)
//!
//! ## Example
//!
//! ```no_run
//! use transfer_indexer::config::Config;
//! use transfer_indexer::error::IndexerResult;
//!
//! # fn main() -> IndexerResult<()> {
//! let config = Config::from_env()?;
//! println!("Indexing {} from block {}", config.token_address(), config.start_block());
//! # Ok(())
//! # }
//! ```

use crate::error::{IndexerError, IndexerResult};
use crate::events::Transfer;
use alloy::json_abi::Event;
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolEvent;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main configuration struct for the indexer.
///
/// Contains all runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ethereum RPC URL
    rpc_url: String,

    /// Contract emitting the indexed events
    token_address: Address,

    /// Canonical event signature, e.g. `Transfer(address,address,uint256)`
    event_signature: String,

    /// Block used when no checkpoint has been saved yet
    start_block: U256,

    /// Number of trailing blocks considered not yet final
    confirmation_blocks: u64,

    /// Block span of a single log query
    batch_size: u64,

    /// Fixed pause between batches
    batch_delay: Duration,

    /// Pause between passes in continuous mode
    poll_interval: Duration,

    /// Pause after a failed batch or pass
    retry_backoff: Duration,

    /// Extra attempts for a failing batch
    max_batch_retries: u32,

    /// SQLite connection string
    database_url: String,

    /// Read API listening port
    port: u16,

    /// Read API requests per minute
    rate_limit_rpm: u32,

    /// Allowed CORS origins
    cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This function:
    /// 1. Loads `.env` file using `dotenvy` (if present)
    /// 2. Reads and validates all environment variables
    /// 3. Applies defaults for optional variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variable values are invalid (e.g., non-numeric for numbers)
    /// - The token address is not a valid Ethereum address
    pub fn from_env() -> IndexerResult<Self> {
        // Load .env file if present (ignore error if file doesn't exist)
        dotenvy::dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// `from_env` delegates here. Tests pass a map lookup instead of
    /// mutating the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use transfer_indexer::config::Config;
    ///
    /// let vars = HashMap::from([
    ///     ("RPC_URL", "http://localhost:8545"),
    ///     ("TOKEN_ADDRESS", "0xdAC17F958D2ee523a2206206994597C13D831ec7"),
    ///     ("START_BLOCK", "19000000"),
    /// ]);
    /// let config = Config::from_vars(|key| vars.get(key).map(ToString::to_string)).unwrap();
    /// assert_eq!(config.batch_size(), 1000);
    /// ```
    pub fn from_vars<F>(lookup: F) -> IndexerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| {
                    IndexerError::config(format!("{key} environment variable is required"), None)
                })
        };

        // Required: RPC endpoint
        let rpc_url = required("RPC_URL")?;
        if !rpc_url.starts_with("http://") && !rpc_url.starts_with("https://") {
            return Err(IndexerError::config(
                format!("RPC_URL must be an http(s) URL, got: {rpc_url}"),
                None,
            ));
        }

        // Required: contract address
        let token_address = required("TOKEN_ADDRESS")?;
        let token_address = Address::from_str(token_address.trim()).map_err(|e| {
            IndexerError::config(
                format!(
                    "TOKEN_ADDRESS must be a valid Ethereum address (0x + 40 hex chars), got: {token_address}"
                ),
                Some(Box::new(e)),
            )
        })?;

        // Required: start block, accepts decimal or 0x-prefixed hex
        let start_block = required("START_BLOCK")?;
        let start_block = U256::from_str(start_block.trim()).map_err(|e| {
            IndexerError::config(
                format!("START_BLOCK must be a valid block number, got: {start_block}"),
                Some(Box::new(e)),
            )
        })?;

        // Optional: event signature or ABI fragment, only the Transfer layout can be decoded
        let event_signature = match lookup("EVENT_SIGNATURE") {
            Some(raw) => canonical_event_signature(&raw)?,
            None => Transfer::SIGNATURE.to_string(),
        };

        let confirmation_blocks = parse_or(&lookup, "CONFIRMATION_BLOCKS", 12_u64)?;

        let batch_size = parse_or(&lookup, "BATCH_SIZE", 1000_u64)?;
        if batch_size == 0 {
            return Err(IndexerError::config("BATCH_SIZE must be at least 1", None));
        }

        let batch_delay = Duration::from_millis(parse_or(&lookup, "BATCH_DELAY_MS", 2000_u64)?);
        let poll_interval = Duration::from_secs(parse_or(&lookup, "POLL_INTERVAL_SECS", 12_u64)?);
        let retry_backoff = Duration::from_secs(parse_or(&lookup, "RETRY_BACKOFF_SECS", 5_u64)?);
        let max_batch_retries = parse_or(&lookup, "MAX_BATCH_RETRIES", 3_u32)?;

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:./indexer.db".to_string());

        let port = parse_or(&lookup, "PORT", 3000_u16)?;

        let rate_limit_rpm = parse_or(&lookup, "RATE_LIMIT_RPM", 600_u32)?;
        if rate_limit_rpm == 0 {
            return Err(IndexerError::config("RATE_LIMIT_RPM must be at least 1", None));
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(ToString::to_string)
            .collect();

        Ok(Self {
            rpc_url,
            token_address,
            event_signature,
            start_block,
            confirmation_blocks,
            batch_size,
            batch_delay,
            poll_interval,
            retry_backoff,
            max_batch_retries,
            database_url,
            port,
            rate_limit_rpm,
            cors_origins,
        })
    }

    /// Override the read API port (used by `serve --port`).
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Get the Ethereum RPC URL.
    #[must_use]
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Get the indexed contract address.
    #[must_use]
    pub const fn token_address(&self) -> Address {
        self.token_address
    }

    /// Get the canonical event signature.
    #[must_use]
    pub fn event_signature(&self) -> &str {
        &self.event_signature
    }

    /// Get the block used when no checkpoint exists.
    #[must_use]
    pub const fn start_block(&self) -> U256 {
        self.start_block
    }

    /// Get the confirmation lag in blocks.
    #[must_use]
    pub const fn confirmation_blocks(&self) -> u64 {
        self.confirmation_blocks
    }

    /// Get the batch span.
    #[must_use]
    pub const fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Get the inter-batch delay.
    #[must_use]
    pub const fn batch_delay(&self) -> Duration {
        self.batch_delay
    }

    /// Get the continuous-mode polling interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Get the failure backoff.
    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }

    /// Get the number of extra attempts per batch.
    #[must_use]
    pub const fn max_batch_retries(&self) -> u32 {
        self.max_batch_retries
    }

    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Get the read API port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Get the read API rate limit.
    #[must_use]
    pub const fn rate_limit_rpm(&self) -> u32 {
        self.rate_limit_rpm
    }

    /// Get the allowed CORS origins.
    #[must_use]
    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }
}

/// Reduce `EVENT_SIGNATURE` to its canonical form and check that it is the
/// ERC-20 `Transfer` event.
///
/// Accepts both `Transfer(address,address,uint256)` and the fragment form
/// `event Transfer(address indexed from, address indexed to, uint256 value)`.
/// When a fragment marks parameters `indexed`, `from` and `to` must be the
/// indexed ones, since decoding reads them from the topics.
fn canonical_event_signature(raw: &str) -> IndexerResult<String> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("event")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .unwrap_or(trimmed)
        .trim();

    let event = Event::parse(&format!("event {body}")).map_err(|e| {
        IndexerError::config(
            format!("EVENT_SIGNATURE is not a valid event signature, got: {raw}"),
            Some(Box::new(e)),
        )
    })?;

    let signature = event.signature();
    if signature != Transfer::SIGNATURE || event.anonymous {
        return Err(IndexerError::config(
            format!(
                "EVENT_SIGNATURE must be {}, got: {raw}",
                Transfer::SIGNATURE
            ),
            None,
        ));
    }

    let indexed: Vec<bool> = event.inputs.iter().map(|input| input.indexed).collect();
    if indexed.contains(&true) && indexed != [true, true, false] {
        return Err(IndexerError::config(
            format!("EVENT_SIGNATURE must index `from` and `to` only, got: {raw}"),
            None,
        ));
    }

    Ok(signature)
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> IndexerResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| {
            IndexerError::config(
                format!("{key} must be a valid number, got: {raw}"),
                Some(Box::new(e)),
            )
        }),
        None => Ok(default),
    }
}
