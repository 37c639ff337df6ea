//! The event log source consumed by the sync engine.
//!
//! [`EventLogSource`] is the seam between the engine and the chain: the
//! engine only ever asks for the current height and for the logs in one
//! block range. [`AlloyLogSource`] implements it over the HTTP provider;
//! tests substitute an in-memory source.

use alloy::primitives::{Address, U256};
use alloy::providers::Provider as AlloyProvider;
use alloy::rpc::types::Log;
use async_trait::async_trait;
use tracing::{debug, instrument};

use super::http::{get_latest_block, Provider};
use crate::error::{IndexerError, IndexerResult};
use crate::events::{create_transfer_filter, RawLog};
use crate::sync::range::BlockRange;

/// Source of block heights and `Transfer` logs for one contract.
#[async_trait]
pub trait EventLogSource: Send + Sync {
    /// Current chain head.
    async fn block_height(&self) -> IndexerResult<U256>;

    /// All `Transfer` logs of the configured contract inside `range`.
    async fn logs(&self, range: BlockRange) -> IndexerResult<Vec<RawLog>>;
}

/// [`EventLogSource`] backed by `eth_blockNumber` and `eth_getLogs`.
#[derive(Debug, Clone)]
pub struct AlloyLogSource {
    provider: Provider,
    token: Address,
}

impl AlloyLogSource {
    /// Create a source for `token`'s events.
    #[must_use]
    pub const fn new(provider: Provider, token: Address) -> Self {
        Self { provider, token }
    }
}

/// Narrow a block number to the `u64` the JSON-RPC filter accepts.
///
/// Out-of-range blocks are a [`IndexerError::SyncError`]: no retry can
/// make the node accept them.
fn to_rpc_block(block: U256) -> IndexerResult<u64> {
    u64::try_from(block).map_err(|e| {
        IndexerError::sync(
            format!("Block {block} is outside the provider's supported range"),
            Some(Box::new(e)),
        )
    })
}

impl From<Log> for RawLog {
    fn from(log: Log) -> Self {
        Self {
            transaction_hash: log.transaction_hash,
            block_number: log.block_number.map(U256::from),
            removed: log.removed,
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
        }
    }
}

#[async_trait]
impl EventLogSource for AlloyLogSource {
    async fn block_height(&self) -> IndexerResult<U256> {
        get_latest_block(&self.provider).await.map(U256::from)
    }

    #[instrument(skip(self), fields(range = %range, count = tracing::field::Empty))]
    async fn logs(&self, range: BlockRange) -> IndexerResult<Vec<RawLog>> {
        let filter = create_transfer_filter(
            self.token,
            to_rpc_block(range.from)?,
            to_rpc_block(range.to)?,
        );

        let logs = self.provider.get_logs(&filter).await.map_err(|e| {
            IndexerError::rpc(format!("Failed to fetch logs for blocks {range}"), Some(Box::new(e)))
        })?;

        tracing::Span::current().record("count", logs.len());
        debug!(count = logs.len(), "Fetched logs");

        Ok(logs.into_iter().map(RawLog::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256, LogData};
    use alloy::sol_types::SolEvent;

    use crate::events::Transfer;

    #[test]
    fn test_to_rpc_block() {
        assert_eq!(to_rpc_block(U256::from(19_000_000)).unwrap(), 19_000_000);
        assert_eq!(to_rpc_block(U256::from(u64::MAX)).unwrap(), u64::MAX);
    }

    #[test]
    fn test_block_beyond_u64_is_not_retried() {
        let err = to_rpc_block(U256::from(u64::MAX) + U256::from(1)).unwrap_err();
        assert!(matches!(err, IndexerError::SyncError { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_raw_log_from_rpc_log() {
        let event = Transfer {
            from: address!("1111111111111111111111111111111111111111"),
            to: address!("2222222222222222222222222222222222222222"),
            value: U256::from(5),
        };
        let data: LogData = event.encode_log_data();
        let tx = b256!("0x00000000000000000000000000000000000000000000000000000000000000bb");

        let log = Log {
            inner: alloy::primitives::Log {
                address: address!("dAC17F958D2ee523a2206206994597C13D831ec7"),
                data: data.clone(),
            },
            block_number: Some(42),
            transaction_hash: Some(tx),
            ..Default::default()
        };

        let raw = RawLog::from(log);
        assert_eq!(raw.transaction_hash, Some(tx));
        assert_eq!(raw.block_number, Some(U256::from(42)));
        assert!(!raw.removed);
        assert_eq!(raw.topics, data.topics().to_vec());
        assert_eq!(raw.data, data.data);
    }
}
