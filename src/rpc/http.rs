//! HTTP provider for the Ethereum JSON-RPC endpoint.
//!
//! Built on Alloy's `ProviderBuilder`. Only read calls are made
//! (`eth_blockNumber`, `eth_getLogs`), so no signing fillers are attached.
//!
//! ## Example
//!
//! ```no_run
//! use transfer_indexer::rpc::{create_provider, get_latest_block};
//! use transfer_indexer::error::IndexerResult;
//!
//! # async fn example() -> IndexerResult<()> {
//! let provider = create_provider("https://eth-mainnet.g.alchemy.com/v2/API_KEY").await?;
//! let latest_block = get_latest_block(&provider).await?;
//! println!("Latest block: {}", latest_block);
//! # Ok(())
//! # }
//! ```

use crate::error::{IndexerError, IndexerResult};
use alloy::providers::{Provider as AlloyProvider, ProviderBuilder, RootProvider};
use alloy::transports::http::{Client, Http};
use tracing::{debug, info, instrument, warn};

/// Type alias for the HTTP provider.
pub type Provider = RootProvider<Http<Client>>;

/// Strip the path (which often carries an API key) from an RPC URL for logging.
#[must_use]
pub fn redact_rpc_url(rpc_url: &str) -> &str {
    let after_scheme = rpc_url.find("://").map_or(0, |i| i + 3);
    rpc_url[after_scheme..]
        .find('/')
        .map_or(rpc_url, |slash| &rpc_url[..after_scheme + slash])
}

/// Create a new Ethereum RPC provider connected via HTTP.
///
/// No request is sent here; an unreachable node surfaces on the first call.
///
/// # Errors
///
/// Returns [`IndexerError::RpcError`] if the URL cannot be parsed.
#[allow(clippy::unused_async)]
#[instrument(skip(rpc_url), fields(rpc_host = tracing::field::Empty))]
pub async fn create_provider(rpc_url: &str) -> IndexerResult<Provider> {
    let host = redact_rpc_url(rpc_url);
    tracing::Span::current().record("rpc_host", host);
    debug!(rpc_host = host, "Creating HTTP provider");

    let url = rpc_url.parse().map_err(|e| {
        let msg = if rpc_url.starts_with("http") {
            format!("Failed to parse RPC URL: '{host}'")
        } else {
            format!(
                "Invalid RPC URL: '{host}'. Expected format: 'https://eth-mainnet.g.alchemy.com/v2/YOUR_KEY'"
            )
        };
        IndexerError::rpc(msg, Some(Box::new(e)))
    })?;

    let provider = ProviderBuilder::new().on_http(url);

    info!(rpc_host = host, "RPC provider initialized");

    Ok(provider)
}

/// Get the latest block number from the node.
///
/// # Errors
///
/// Returns [`IndexerError::RpcError`] if the request fails.
#[instrument(skip(provider), fields(block = tracing::field::Empty, duration_ms = tracing::field::Empty))]
pub async fn get_latest_block(provider: &Provider) -> IndexerResult<u64> {
    debug!("Fetching latest block number");

    let start = std::time::Instant::now();
    let block_number = provider
        .get_block_number()
        .await
        .map_err(|e| IndexerError::rpc("Failed to fetch latest block number", Some(Box::new(e))))?;

    let duration = start.elapsed();
    tracing::Span::current().record("block", block_number);
    tracing::Span::current().record("duration_ms", u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));

    debug!(
        block = block_number,
        duration_ms = duration.as_millis(),
        "Latest block fetched"
    );

    Ok(block_number)
}

/// Verify the node answers by fetching the latest block.
///
/// # Errors
///
/// Returns [`IndexerError::RpcError`] if the node cannot be reached.
#[instrument(skip(provider))]
pub async fn check_connection(provider: &Provider) -> IndexerResult<u64> {
    match get_latest_block(provider).await {
        Ok(block) => {
            info!(block, "Connection check successful");
            Ok(block)
        }
        Err(e) => {
            warn!(error = %e, "Connection check failed");
            Err(IndexerError::rpc(
                "Provider connection health check failed",
                Some(Box::new(e)),
            ))
        }
    }
}
