//! Storage seams for the sync engine.
//!
//! The engine reads and writes through two traits so it can run against
//! SQLite in production and in-memory stores in tests:
//!
//! - [`CheckpointStore`]: the single "next block to sync" marker
//! - [`TransferRepository`]: deduplicated transfer rows

use std::sync::{Mutex, PoisonError};

use alloy::primitives::U256;
use async_trait::async_trait;

use crate::db::models::NewTransfer;
use crate::db::repository::Repository;
use crate::error::IndexerResult;

/// Trait for loading and saving the sync checkpoint.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// The next block to sync, or the configured start block when nothing
    /// has been saved yet.
    async fn get(&self) -> IndexerResult<U256>;

    /// Replace the stored checkpoint.
    async fn set(&self, next_block: U256) -> IndexerResult<()>;
}

/// Write side of the transfer table as seen by the engine.
#[async_trait]
pub trait TransferRepository: Send + Sync {
    /// Store a whole batch atomically. Rows whose transaction hash is
    /// already present are left untouched. Returns the number written.
    async fn insert_batch_if_absent(&self, transfers: &[NewTransfer]) -> IndexerResult<u64>;
}

#[async_trait]
impl TransferRepository for Repository {
    async fn insert_batch_if_absent(&self, transfers: &[NewTransfer]) -> IndexerResult<u64> {
        self.batch_insert_transfers(transfers).await
    }
}

/// [`CheckpointStore`] over the `checkpoint` table.
#[derive(Debug, Clone)]
pub struct SqliteCheckpointStore {
    repository: Repository,
    start_block: U256,
}

impl SqliteCheckpointStore {
    /// Create a store that falls back to `start_block` before the first save.
    #[must_use]
    pub const fn new(repository: Repository, start_block: U256) -> Self {
        Self {
            repository,
            start_block,
        }
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn get(&self) -> IndexerResult<U256> {
        Ok(self
            .repository
            .get_checkpoint()
            .await?
            .unwrap_or(self.start_block))
    }

    async fn set(&self, next_block: U256) -> IndexerResult<()> {
        self.repository.set_checkpoint(next_block).await
    }
}

// ─── In-memory store (for testing) ────────────────────────────────────────────

/// In-memory checkpoint store for tests and dry runs.
#[derive(Debug)]
pub struct MemoryCheckpointStore {
    start_block: U256,
    saved: Mutex<Vec<U256>>,
}

impl MemoryCheckpointStore {
    /// Create an empty store with the given fallback.
    #[must_use]
    pub const fn new(start_block: U256) -> Self {
        Self {
            start_block,
            saved: Mutex::new(Vec::new()),
        }
    }

    /// The stored value, if any pass has saved one.
    #[must_use]
    pub fn stored(&self) -> Option<U256> {
        self.history().last().copied()
    }

    /// Every value ever saved, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<U256> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn get(&self) -> IndexerResult<U256> {
        Ok(self.stored().unwrap_or(self.start_block))
    }

    async fn set(&self, next_block: U256) -> IndexerResult<()> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(next_block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    #[tokio::test]
    async fn test_sqlite_store_falls_back_to_start_block() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let store = SqliteCheckpointStore::new(Repository::new(pool), U256::from(100));

        assert_eq!(store.get().await.unwrap(), U256::from(100));

        store.set(U256::from(141)).await.unwrap();
        assert_eq!(store.get().await.unwrap(), U256::from(141));
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryCheckpointStore::new(U256::from(7));
        assert_eq!(store.get().await.unwrap(), U256::from(7));
        assert!(store.stored().is_none());

        store.set(U256::from(10)).await.unwrap();
        store.set(U256::from(20)).await.unwrap();

        assert_eq!(store.get().await.unwrap(), U256::from(20));
        assert_eq!(store.history(), vec![U256::from(10), U256::from(20)]);
    }

    #[tokio::test]
    async fn test_repository_trait_delegates() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let repo = Repository::new(pool);
        let transfer = NewTransfer {
            tx_hash: "0x01".to_string(),
            block_number: U256::from(5),
            from: "0x1111111111111111111111111111111111111111".to_string(),
            to: "0x2222222222222222222222222222222222222222".to_string(),
            value: U256::from(9),
        };

        let batch = std::slice::from_ref(&transfer);
        assert_eq!(repo.insert_batch_if_absent(batch).await.unwrap(), 1);
        assert_eq!(repo.insert_batch_if_absent(batch).await.unwrap(), 0);

        let listed = repo.list_recent_transfers(20, 0).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].tx_hash, "0x01");
    }
}
