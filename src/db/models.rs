//! Database models that map to SQL tables.
//!
//! These structures represent rows in the database and provide
//! conversions from chain types to their stored representation.
//! Block numbers and token values are `U256` in memory and base-10
//! `TEXT` in SQLite so no precision is lost.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{IndexerError, IndexerResult};

/// A decoded transfer that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransfer {
    /// Transaction hash (hex string with 0x prefix), the row's unique key
    pub tx_hash: String,
    /// Block containing the transfer
    pub block_number: U256,
    /// Sender address (EIP-55 checksummed)
    pub from: String,
    /// Recipient address (EIP-55 checksummed)
    pub to: String,
    /// Amount transferred, in the token's smallest unit
    pub value: U256,
}

/// Represents a stored transfer.
///
/// Maps to the `transfer` table. Rows are only ever inserted; an existing
/// row is never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TransferRecord {
    /// Transaction hash (hex string with 0x prefix)
    pub tx_hash: String,
    /// Block number (stored as TEXT for U256 precision)
    pub block_number: String,
    /// Sender address
    pub from_address: String,
    /// Recipient address
    pub to_address: String,
    /// Transferred amount (stored as TEXT for U256 precision)
    pub value: String,
    /// Unix timestamp when the row was inserted
    pub created_at: i64,
}

impl TransferRecord {
    /// Creates a record for insertion, stamped with the current time.
    #[must_use]
    pub fn new(transfer: &NewTransfer) -> Self {
        Self {
            tx_hash: transfer.tx_hash.clone(),
            block_number: transfer.block_number.to_string(),
            from_address: transfer.from.clone(),
            to_address: transfer.to.clone(),
            value: transfer.value.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Converts block_number TEXT back to U256.
    ///
    /// # Errors
    ///
    /// Returns a decoding error if the stored text is not a decimal number.
    pub fn block_number_u256(&self) -> IndexerResult<U256> {
        parse_decimal("block_number", &self.block_number)
    }

    /// Converts value TEXT back to U256.
    ///
    /// # Errors
    ///
    /// Returns a decoding error if the stored text is not a decimal number.
    pub fn value_u256(&self) -> IndexerResult<U256> {
        parse_decimal("value", &self.value)
    }
}

/// Represents the sync checkpoint.
///
/// Maps to the single-row `checkpoint` table (`id` is always 1).
/// `last_block` is the next block a pass will start from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CheckpointRecord {
    /// Fixed key of the singleton row
    pub id: i64,
    /// Next block to sync (stored as TEXT for U256 precision)
    pub last_block: String,
    /// Unix timestamp of the last save
    pub updated_at: i64,
}

impl CheckpointRecord {
    /// Key of the one checkpoint row.
    pub const SINGLETON_ID: i64 = 1;

    /// Creates a checkpoint record stamped with the current time.
    #[must_use]
    pub fn new(last_block: U256) -> Self {
        Self {
            id: Self::SINGLETON_ID,
            last_block: last_block.to_string(),
            updated_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Parses last_block back to U256.
    ///
    /// # Errors
    ///
    /// Returns a decoding error if the stored text is not a decimal number.
    pub fn last_block_u256(&self) -> IndexerResult<U256> {
        parse_decimal("last_block", &self.last_block)
    }
}

fn parse_decimal(column: &str, text: &str) -> IndexerResult<U256> {
    U256::from_str_radix(text, 10).map_err(|e| {
        IndexerError::decoding(
            format!("Failed to parse {column}: {text}"),
            Some(Box::new(e)),
        )
    })
}
