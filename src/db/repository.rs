//! Repository pattern for database operations.
//!
//! Provides the queries behind both storage components:
//! - transfers: idempotent inserts and newest-first listing
//! - checkpoint: read and upsert of the singleton row

use alloy::primitives::U256;
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use super::models::{CheckpointRecord, NewTransfer, TransferRecord};
use crate::error::IndexerError;

// length() first: canonical decimal text orders numerically by (length, text).
const NEWEST_FIRST: &str =
    "ORDER BY length(block_number) DESC, block_number DESC, tx_hash ASC";

/// Repository for database operations.
///
/// Wraps a SQLite connection pool and provides type-safe methods
/// for all database interactions. Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Creates a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== TRANSFER OPERATIONS ====================

    /// Inserts a batch of transfers in a single transaction.
    ///
    /// A row whose transaction hash already exists is left untouched. Either
    /// the whole batch commits or nothing does. Returns the number of rows
    /// actually written.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use alloy::primitives::U256;
    /// use transfer_indexer::db::{create_pool, models::NewTransfer, repository::Repository};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let pool = create_pool("sqlite:./indexer.db").await?;
    ///     let repo = Repository::new(pool);
    ///
    ///     let transfer = NewTransfer {
    ///         tx_hash: "0xabc".to_string(),
    ///         block_number: U256::from(19_000_000),
    ///         from: "0x1111111111111111111111111111111111111111".to_string(),
    ///         to: "0x2222222222222222222222222222222222222222".to_string(),
    ///         value: U256::from(1_000_000),
    ///     };
    ///     assert_eq!(repo.batch_insert_transfers(&[transfer.clone()]).await?, 1);
    ///     assert_eq!(repo.batch_insert_transfers(&[transfer]).await?, 0);
    ///     Ok(())
    /// }
    /// ```
    #[instrument(skip(self, transfers), fields(count = transfers.len(), inserted = tracing::field::Empty))]
    pub async fn batch_insert_transfers(
        &self,
        transfers: &[NewTransfer],
    ) -> Result<u64, IndexerError> {
        if transfers.is_empty() {
            debug!("Empty transfer batch, skipping");
            return Ok(0);
        }

        let start = std::time::Instant::now();

        let mut tx = self.pool.begin().await.map_err(|e| {
            IndexerError::database("Failed to start transaction", Some(Box::new(e)))
        })?;

        let mut inserted = 0_u64;
        for transfer in transfers {
            let record = TransferRecord::new(transfer);
            let result = sqlx::query(
                r#"
                INSERT INTO transfer (
                    tx_hash, block_number, from_address, to_address, value, created_at
                )
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT (tx_hash) DO NOTHING
                "#,
            )
            .bind(&record.tx_hash)
            .bind(&record.block_number)
            .bind(&record.from_address)
            .bind(&record.to_address)
            .bind(&record.value)
            .bind(record.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                IndexerError::database(
                    format!(
                        "Failed to insert transfer {} at block {}",
                        record.tx_hash, record.block_number
                    ),
                    Some(Box::new(e)),
                )
            })?;
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            IndexerError::database("Failed to commit transaction", Some(Box::new(e)))
        })?;

        tracing::Span::current().record("inserted", inserted);
        debug!(
            count = transfers.len(),
            inserted,
            duration_ms = start.elapsed().as_millis(),
            "Batch insert committed"
        );

        Ok(inserted)
    }

    /// Gets up to `limit` transfers, highest block first, skipping `offset`.
    ///
    /// Rows within one block are ordered by transaction hash so pages are
    /// stable across calls.
    pub async fn list_recent_transfers(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<TransferRecord>, IndexerError> {
        let query = format!(
            "SELECT tx_hash, block_number, from_address, to_address, value, created_at \
             FROM transfer {NEWEST_FIRST} LIMIT ? OFFSET ?"
        );

        let transfers = sqlx::query_as::<_, TransferRecord>(&query)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                IndexerError::database("Failed to query recent transfers", Some(Box::new(e)))
            })?;

        Ok(transfers)
    }

    /// Counts stored transfers.
    pub async fn count_transfers(&self) -> Result<u64, IndexerError> {
        let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM transfer")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                IndexerError::database("Failed to count transfers", Some(Box::new(e)))
            })?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    // ==================== CHECKPOINT OPERATIONS ====================

    /// Gets the stored checkpoint.
    ///
    /// Returns `None` if no pass has completed yet (first run).
    pub async fn get_checkpoint(&self) -> Result<Option<U256>, IndexerError> {
        let record = sqlx::query_as::<_, CheckpointRecord>(
            "SELECT id, last_block, updated_at FROM checkpoint WHERE id = ?",
        )
        .bind(CheckpointRecord::SINGLETON_ID)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IndexerError::database("Failed to query checkpoint", Some(Box::new(e))))?;

        record.map(|r| r.last_block_u256()).transpose()
    }

    /// Stores `next_block` as the checkpoint, replacing any previous value.
    ///
    /// A single upsert on the fixed key, so readers see either the old or
    /// the new value.
    pub async fn set_checkpoint(&self, next_block: U256) -> Result<(), IndexerError> {
        let record = CheckpointRecord::new(next_block);

        sqlx::query(
            r#"
            INSERT INTO checkpoint (id, last_block, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                last_block = excluded.last_block,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(record.id)
        .bind(&record.last_block)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| IndexerError::database("Failed to save checkpoint", Some(Box::new(e))))?;

        info!(checkpoint = %record.last_block, "Checkpoint saved");
        Ok(())
    }

    // ==================== HEALTH ====================

    /// Health check for database connectivity.
    pub async fn health_check(&self) -> Result<(), IndexerError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| IndexerError::database("Database health check failed", Some(Box::new(e))))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    async fn setup_test_db() -> Repository {
        let pool = create_pool("sqlite::memory:")
            .await
            .expect("Failed to create pool");
        Repository::new(pool)
    }

    fn transfer(tx: &str, block: u64) -> NewTransfer {
        NewTransfer {
            tx_hash: tx.to_string(),
            block_number: U256::from(block),
            from: "0x1111111111111111111111111111111111111111".to_string(),
            to: "0x2222222222222222222222222222222222222222".to_string(),
            value: U256::from(block * 10),
        }
    }

    #[tokio::test]
    async fn test_insert_if_absent_is_idempotent() {
        let repo = setup_test_db().await;
        let original = transfer("0xaa", 100);

        assert_eq!(repo.batch_insert_transfers(&[original.clone()]).await.unwrap(), 1);

        // Same key, different fields: must not overwrite
        let mut changed = original.clone();
        changed.value = U256::from(1);
        changed.block_number = U256::from(999);
        assert_eq!(repo.batch_insert_transfers(&[changed]).await.unwrap(), 0);

        let stored = repo.list_recent_transfers(1, 0).await.unwrap().remove(0);
        assert_eq!(stored.tx_hash, "0xaa");
        assert_eq!(stored.value, "1000");
        assert_eq!(stored.block_number, "100");
        assert_eq!(repo.count_transfers().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_batch_insert_counts_new_rows_only() {
        let repo = setup_test_db().await;
        repo.batch_insert_transfers(&[transfer("0x01", 1)]).await.unwrap();

        let batch = vec![transfer("0x01", 1), transfer("0x02", 2), transfer("0x02", 2)];
        let inserted = repo.batch_insert_transfers(&batch).await.unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(repo.count_transfers().await.unwrap(), 2);
        assert_eq!(repo.batch_insert_transfers(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_recent_orders_numerically() {
        let repo = setup_test_db().await;
        // "9" > "10" lexicographically; the query must not be fooled
        let mut rows: Vec<NewTransfer> = [("0x09", 9), ("0x10", 10), ("0x0a", 100), ("0x0b", 100)]
            .into_iter()
            .map(|(tx, block)| transfer(tx, block))
            .collect();
        rows.push(NewTransfer {
            block_number: U256::from(u128::MAX),
            ..transfer("0xff", 0)
        });
        assert_eq!(repo.batch_insert_transfers(&rows).await.unwrap(), 5);

        let listed = repo.list_recent_transfers(10, 0).await.unwrap();
        let order: Vec<&str> = listed.iter().map(|t| t.tx_hash.as_str()).collect();
        assert_eq!(order, ["0xff", "0x0a", "0x0b", "0x10", "0x09"]);

        let page = repo.list_recent_transfers(2, 1).await.unwrap();
        let order: Vec<&str> = page.iter().map(|t| t.tx_hash.as_str()).collect();
        assert_eq!(order, ["0x0a", "0x0b"]);
    }

    #[tokio::test]
    async fn test_list_recent_empty() {
        let repo = setup_test_db().await;
        assert!(repo.list_recent_transfers(20, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkpoint_management() {
        let repo = setup_test_db().await;

        // No checkpoint initially
        assert!(repo.get_checkpoint().await.unwrap().is_none());

        repo.set_checkpoint(U256::from(141)).await.unwrap();
        assert_eq!(repo.get_checkpoint().await.unwrap(), Some(U256::from(141)));

        // Overwritten, still one row
        let big = U256::from(u64::MAX) * U256::from(4);
        repo.set_checkpoint(big).await.unwrap();
        assert_eq!(repo.get_checkpoint().await.unwrap(), Some(big));

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM checkpoint")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_health_check() {
        let repo = setup_test_db().await;
        assert!(repo.health_check().await.is_ok());
    }
}
