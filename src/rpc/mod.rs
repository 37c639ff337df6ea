//! RPC access to the Ethereum node.
//!
//! - [`http`]: Alloy HTTP provider construction and head queries
//! - [`source`]: the [`EventLogSource`] seam the sync engine reads through
//!
//! ```rust,ignore
//! use transfer_indexer::rpc::{create_provider, AlloyLogSource, EventLogSource};
//!
//! # async fn example(token: alloy::primitives::Address) -> transfer_indexer::error::IndexerResult<()> {
//! let provider = create_provider("https://eth-mainnet.g.alchemy.com/v2/KEY").await?;
//! let source = AlloyLogSource::new(provider, token);
//! let head = source.block_height().await?;
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod source;

// Re-export commonly used types
pub use http::{check_connection, create_provider, get_latest_block, redact_rpc_url, Provider};
pub use source::{AlloyLogSource, EventLogSource};
