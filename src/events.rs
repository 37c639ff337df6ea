//! ERC-20 `Transfer` events with compile-time type safety.
//!
//! The event layout is generated by Alloy's `sol!` macro, so the signature
//! hash, topic decoding and data decoding all come from one Solidity line.
//!
//! Log entries arrive as [`RawLog`] values from an
//! [`EventLogSource`](crate::rpc::source::EventLogSource). [`decode_transfer`]
//! turns one into a [`NewTransfer`] ready for storage, or reports why it
//! cannot be indexed:
//!
//! - [`Decoded::Skipped`]: no transaction hash or the log was removed by the node
//! - `Err(IndexerError::DecodingError)`: the entry is malformed
//!
//! ## Example
//!
//! ```
//! use alloy::primitives::{address, b256, U256};
//! use alloy::sol_types::SolEvent;
//! use transfer_indexer::events::{decode_transfer, Decoded, RawLog, Transfer};
//!
//! let event = Transfer {
//!     from: address!("1111111111111111111111111111111111111111"),
//!     to: address!("2222222222222222222222222222222222222222"),
//!     value: U256::from(42),
//! };
//! let log = RawLog::from_log_data(
//!     Some(b256!("0x00000000000000000000000000000000000000000000000000000000000000aa")),
//!     Some(U256::from(19_000_000)),
//!     event.encode_log_data(),
//! );
//!
//! match decode_transfer(&log).unwrap() {
//!     Decoded::Transfer(transfer) => assert_eq!(transfer.value, U256::from(42)),
//!     Decoded::Skipped(reason) => panic!("unexpected skip: {reason}"),
//! }
//! ```

use alloy::primitives::{Address, Bytes, LogData, B256, U256};
use alloy::rpc::types::Filter;
use alloy::sol;
use alloy::sol_types::SolEvent;

use crate::db::models::NewTransfer;
use crate::error::{IndexerError, IndexerResult};

// Generate the ERC-20 interface using the sol! macro.
sol! {
    interface IERC20 {
        /// Emitted when `value` tokens move from `from` to `to`.
        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}

// Re-export the generated type for easier access
pub use IERC20::Transfer;

/// A log entry as returned by the event log source, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    /// Hash of the emitting transaction; absent for pending logs
    pub transaction_hash: Option<B256>,
    /// Block containing the log; absent for pending logs
    pub block_number: Option<U256>,
    /// Set by the node when the log was dropped by a reorganization
    pub removed: bool,
    /// Event topics, signature hash first
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed fields
    pub data: Bytes,
}

impl RawLog {
    /// Build a raw log from already-encoded log data.
    #[must_use]
    pub fn from_log_data(
        transaction_hash: Option<B256>,
        block_number: Option<U256>,
        log_data: LogData,
    ) -> Self {
        Self {
            transaction_hash,
            block_number,
            removed: false,
            topics: log_data.topics().to_vec(),
            data: log_data.data,
        }
    }
}

/// Outcome of decoding one raw log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A transfer ready to be written
    Transfer(NewTransfer),
    /// Not indexable yet, but not malformed either
    Skipped(&'static str),
}

/// Create a filter for `Transfer` events emitted by `token` within
/// `from_block..=to_block`.
#[must_use]
pub fn create_transfer_filter(token: Address, from_block: u64, to_block: u64) -> Filter {
    Filter::new()
        .address(token)
        .event_signature(Transfer::SIGNATURE_HASH)
        .from_block(from_block)
        .to_block(to_block)
}

/// Decode a raw log into a transfer.
///
/// # Errors
///
/// Returns [`IndexerError::DecodingError`] when the log carries no block
/// number or its topics and data do not match the `Transfer` layout.
pub fn decode_transfer(log: &RawLog) -> IndexerResult<Decoded> {
    if log.removed {
        return Ok(Decoded::Skipped("log removed by reorganization"));
    }

    let Some(tx_hash) = log.transaction_hash else {
        return Ok(Decoded::Skipped("missing transaction hash"));
    };

    let block_number = log.block_number.ok_or_else(|| {
        IndexerError::decoding(format!("Log in transaction {tx_hash:?} has no block number"), None)
    })?;

    let log_data = LogData::new_unchecked(log.topics.clone(), log.data.clone());
    let event = Transfer::decode_log_data(&log_data, true).map_err(|e| {
        IndexerError::decoding(
            format!("Failed to decode Transfer event in transaction {tx_hash:?}"),
            Some(Box::new(e)),
        )
    })?;

    Ok(Decoded::Transfer(NewTransfer {
        tx_hash: format!("{tx_hash:?}"),
        block_number,
        from: event.from.to_checksum(None),
        to: event.to.to_checksum(None),
        value: event.value,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256, keccak256};

    const FROM: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
    const TO: Address = address!("dAC17F958D2ee523a2206206994597C13D831ec7");
    const TX: B256 = b256!("0x1111111111111111111111111111111111111111111111111111111111111111");

    fn transfer_log(value: U256) -> RawLog {
        let event = Transfer {
            from: FROM,
            to: TO,
            value,
        };
        RawLog::from_log_data(Some(TX), Some(U256::from(19_000_000)), event.encode_log_data())
    }

    #[test]
    fn test_transfer_signature() {
        assert_eq!(Transfer::SIGNATURE, "Transfer(address,address,uint256)");
        assert_eq!(
            Transfer::SIGNATURE_HASH,
            keccak256("Transfer(address,address,uint256)")
        );
    }

    #[test]
    fn test_decode_valid_transfer() {
        let decoded = decode_transfer(&transfer_log(U256::MAX)).unwrap();

        let Decoded::Transfer(transfer) = decoded else {
            panic!("expected a transfer");
        };
        assert_eq!(transfer.tx_hash, format!("{TX:?}"));
        assert_eq!(transfer.block_number, U256::from(19_000_000));
        assert_eq!(transfer.from, "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
        assert_eq!(transfer.to, "0xdAC17F958D2ee523a2206206994597C13D831ec7");
        assert_eq!(transfer.value, U256::MAX);
    }

    #[test]
    fn test_missing_transaction_hash_is_skipped() {
        let mut log = transfer_log(U256::from(1));
        log.transaction_hash = None;

        assert!(matches!(decode_transfer(&log), Ok(Decoded::Skipped(_))));
    }

    #[test]
    fn test_removed_log_is_skipped() {
        let mut log = transfer_log(U256::from(1));
        log.removed = true;

        assert!(matches!(decode_transfer(&log), Ok(Decoded::Skipped(_))));
    }

    #[test]
    fn test_missing_block_number_is_decoding_error() {
        let mut log = transfer_log(U256::from(1));
        log.block_number = None;

        assert!(matches!(
            decode_transfer(&log),
            Err(IndexerError::DecodingError { .. })
        ));
    }

    #[test]
    fn test_wrong_topic_is_decoding_error() {
        let mut log = transfer_log(U256::from(1));
        log.topics[0] = keccak256("Approval(address,address,uint256)");

        assert!(matches!(
            decode_transfer(&log),
            Err(IndexerError::DecodingError { .. })
        ));
    }

    #[test]
    fn test_truncated_data_is_decoding_error() {
        let mut log = transfer_log(U256::from(1));
        log.data = Bytes::from(vec![0u8; 7]);

        assert!(decode_transfer(&log).is_err());
    }

    #[test]
    fn test_filter_creation() {
        let filter = create_transfer_filter(TO, 100, 120);
        let _ = filter;
    }
}
