//! The sync engine: checkpointed, batched ingestion of `Transfer` logs.
//!
//! One pass reads the checkpoint, computes the safe head, walks the
//! range in batches (fetch, decode, idempotent write) and finally saves
//! `safe_head + 1`. The checkpoint is written once per pass, after every
//! batch succeeded; an aborted pass leaves it untouched and the next pass
//! repeats the same range.
//!
//! ```text
//! COMPUTE_RANGE → FETCH_BATCH → WRITE_BATCH ─┬─ next batch ─→ FETCH_BATCH
//!                     │  ▲           │       └─ done ──→ SAVE_CHECKPOINT
//!                     ▼  │ backoff   ▼
//!                     RETRY ◀────────┘
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;
use tracing::{debug, error, info, instrument, warn};

use super::range::{batches, safe_head, BlockRange};
use super::store::{CheckpointStore, TransferRepository};
use crate::config::Config;
use crate::error::{IndexerError, IndexerResult};
use crate::events::{decode_transfer, Decoded};
use crate::rpc::source::EventLogSource;

/// Tunables for the sync loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Trailing blocks treated as not yet final
    pub confirmation_blocks: u64,
    /// Batch span (see [`batches`])
    pub batch_size: u64,
    /// Fixed pause between consecutive batches
    pub batch_delay: Duration,
    /// Continuous mode: pause between passes
    pub poll_interval: Duration,
    /// Pause after any failure
    pub retry_backoff: Duration,
    /// Extra attempts per batch on transient errors
    pub max_batch_retries: u32,
}

impl From<&Config> for SyncSettings {
    fn from(config: &Config) -> Self {
        Self {
            confirmation_blocks: config.confirmation_blocks(),
            batch_size: config.batch_size(),
            batch_delay: config.batch_delay(),
            poll_interval: config.poll_interval(),
            retry_backoff: config.retry_backoff(),
            max_batch_retries: config.max_batch_retries(),
        }
    }
}

/// How long the engine keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Exactly one pass, then return its result
    OneShot,
    /// Pass after pass until the task is dropped
    Continuous,
}

/// Counters for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Log entries returned by the source
    pub fetched: usize,
    /// Rows actually written (duplicates excluded)
    pub inserted: u64,
    /// Entries not indexed: no tx hash, removed, or undecodable
    pub skipped: usize,
}

/// Totals for a completed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    /// Blocks covered, `[checkpoint, safe_head]`
    pub range: BlockRange,
    /// Number of batches processed
    pub batches: u64,
    /// Log entries returned by the source
    pub fetched: usize,
    /// Rows written
    pub inserted: u64,
    /// Entries not indexed
    pub skipped: usize,
    /// Checkpoint saved at the end of the pass
    pub checkpoint: U256,
}

impl PassSummary {
    fn record(&mut self, stats: BatchStats) {
        self.batches += 1;
        self.fetched += stats.fetched;
        self.inserted += stats.inserted;
        self.skipped += stats.skipped;
    }
}

/// Result of [`SyncEngine::run_pass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Nothing final beyond the checkpoint; no fetches, no writes
    UpToDate {
        /// Unchanged checkpoint
        checkpoint: U256,
        /// Chain head seen by this pass
        head: U256,
    },
    /// Every batch in range was written and the checkpoint advanced
    Synced(PassSummary),
}

impl PassOutcome {
    /// The checkpoint after this pass.
    #[must_use]
    pub const fn checkpoint(&self) -> U256 {
        match self {
            Self::UpToDate { checkpoint, .. } => *checkpoint,
            Self::Synced(summary) => summary.checkpoint,
        }
    }
}

impl fmt::Display for PassOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpToDate { checkpoint, head } => {
                write!(f, "up to date (checkpoint {checkpoint}, head {head})")
            }
            Self::Synced(s) => write!(
                f,
                "synced {} in {} batch(es): {} fetched, {} inserted, {} skipped, checkpoint {}",
                s.range, s.batches, s.fetched, s.inserted, s.skipped, s.checkpoint
            ),
        }
    }
}

/// Drives passes against an event source and the two stores.
///
/// The engine is the only writer of both stores. Batches run strictly in
/// order on the calling task.
pub struct SyncEngine {
    source: Arc<dyn EventLogSource>,
    checkpoints: Arc<dyn CheckpointStore>,
    transfers: Arc<dyn TransferRepository>,
    settings: SyncSettings,
}

impl SyncEngine {
    /// Create an engine over explicitly constructed collaborators.
    #[must_use]
    pub fn new(
        source: Arc<dyn EventLogSource>,
        checkpoints: Arc<dyn CheckpointStore>,
        transfers: Arc<dyn TransferRepository>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            source,
            checkpoints,
            transfers,
            settings,
        }
    }

    /// Run in the given mode.
    ///
    /// [`SyncMode::OneShot`] returns the pass outcome. [`SyncMode::Continuous`]
    /// never returns: failures are logged and followed by the retry backoff,
    /// successes by the poll interval.
    ///
    /// # Errors
    ///
    /// One-shot mode returns the error that aborted the pass.
    pub async fn run(&self, mode: SyncMode) -> IndexerResult<PassOutcome> {
        match mode {
            SyncMode::OneShot => {
                let outcome = self.run_pass().await?;
                log_outcome(&outcome);
                Ok(outcome)
            }
            SyncMode::Continuous => {
                info!(
                    poll_interval_secs = self.settings.poll_interval.as_secs_f64(),
                    "Continuous sync started"
                );
                loop {
                    match self.run_pass().await {
                        Ok(outcome) => {
                            log_outcome(&outcome);
                            tokio::time::sleep(self.settings.poll_interval).await;
                        }
                        Err(e) => {
                            error!(
                                error = %e,
                                transient = e.is_transient(),
                                backoff_secs = self.settings.retry_backoff.as_secs_f64(),
                                "Sync pass failed; checkpoint unchanged"
                            );
                            tokio::time::sleep(self.settings.retry_backoff).await;
                        }
                    }
                }
            }
        }
    }

    /// Run one pass from the stored checkpoint to the current safe head.
    ///
    /// # Errors
    ///
    /// Returns the first error that survives the batch retries, or a
    /// failure reading the checkpoint or chain head. The checkpoint is not
    /// written in either case.
    #[instrument(skip(self), fields(checkpoint = tracing::field::Empty, head = tracing::field::Empty))]
    pub async fn run_pass(&self) -> IndexerResult<PassOutcome> {
        let checkpoint = self.checkpoints.get().await?;
        let head = self.source.block_height().await?;
        let span = tracing::Span::current();
        span.record("checkpoint", tracing::field::display(checkpoint));
        span.record("head", tracing::field::display(head));

        let Some(safe_head) =
            safe_head(head, self.settings.confirmation_blocks).filter(|s| *s >= checkpoint)
        else {
            debug!(%checkpoint, %head, "No final blocks past checkpoint");
            return Ok(PassOutcome::UpToDate { checkpoint, head });
        };

        let range = BlockRange::new(checkpoint, safe_head);
        info!(
            %range,
            blocks = %range.block_count(),
            batch_size = self.settings.batch_size,
            "Sync pass started"
        );

        let mut summary = PassSummary {
            range,
            batches: 0,
            fetched: 0,
            inserted: 0,
            skipped: 0,
            checkpoint,
        };

        for batch in batches(checkpoint, safe_head, self.settings.batch_size) {
            if summary.batches > 0 && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }
            let stats = self.sync_batch_with_retry(batch).await?;
            summary.record(stats);
        }

        let next = safe_head.saturating_add(U256::from(1));
        if next < checkpoint {
            return Err(IndexerError::sync(
                format!("Refusing to move checkpoint backwards from {checkpoint} to {next}"),
                None,
            ));
        }
        self.checkpoints.set(next).await?;
        summary.checkpoint = next;

        Ok(PassOutcome::Synced(summary))
    }

    /// Attempt a batch, retrying transient failures after the backoff.
    async fn sync_batch_with_retry(&self, range: BlockRange) -> IndexerResult<BatchStats> {
        let mut attempt = 0_u32;
        loop {
            match self.sync_batch(range).await {
                Ok(stats) => return Ok(stats),
                Err(e) if e.is_transient() && attempt < self.settings.max_batch_retries => {
                    attempt += 1;
                    warn!(
                        %range,
                        attempt,
                        max_retries = self.settings.max_batch_retries,
                        error = %e,
                        "Batch failed, retrying"
                    );
                    tokio::time::sleep(self.settings.retry_backoff).await;
                }
                Err(e) => {
                    error!(%range, attempts = attempt + 1, error = %e, "Batch failed, aborting pass");
                    return Err(e);
                }
            }
        }
    }

    /// Fetch, decode and write a single batch.
    #[instrument(skip(self), fields(range = %range))]
    async fn sync_batch(&self, range: BlockRange) -> IndexerResult<BatchStats> {
        let logs = self.source.logs(range).await?;

        let mut stats = BatchStats {
            fetched: logs.len(),
            ..BatchStats::default()
        };
        let mut transfers = Vec::with_capacity(logs.len());

        for log in &logs {
            match decode_transfer(log) {
                Ok(Decoded::Transfer(transfer)) => transfers.push(transfer),
                Ok(Decoded::Skipped(reason)) => {
                    debug!(tx_hash = ?log.transaction_hash, reason, "Skipping log");
                    stats.skipped += 1;
                }
                Err(e) => {
                    warn!(tx_hash = ?log.transaction_hash, error = %e, "Skipping undecodable log");
                    stats.skipped += 1;
                }
            }
        }

        stats.inserted = self.transfers.insert_batch_if_absent(&transfers).await?;

        debug!(
            fetched = stats.fetched,
            inserted = stats.inserted,
            skipped = stats.skipped,
            "Batch written"
        );

        Ok(stats)
    }
}

fn log_outcome(outcome: &PassOutcome) {
    match outcome {
        PassOutcome::UpToDate { checkpoint, head } => {
            info!(%checkpoint, %head, "Sync pass: up to date");
        }
        PassOutcome::Synced(s) => {
            info!(
                from = %s.range.from,
                to = %s.range.to,
                batches = s.batches,
                fetched = s.fetched,
                inserted = s.inserted,
                skipped = s.skipped,
                checkpoint = %s.checkpoint,
                "Sync pass completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_record() {
        let mut summary = PassSummary {
            range: BlockRange::new(U256::from(1), U256::from(10)),
            batches: 0,
            fetched: 0,
            inserted: 0,
            skipped: 0,
            checkpoint: U256::from(1),
        };
        summary.record(BatchStats {
            fetched: 3,
            inserted: 2,
            skipped: 1,
        });
        summary.record(BatchStats {
            fetched: 1,
            inserted: 0,
            skipped: 0,
        });

        assert_eq!(summary.batches, 2);
        assert_eq!(summary.fetched, 4);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_outcome_display_and_checkpoint() {
        let up_to_date = PassOutcome::UpToDate {
            checkpoint: U256::from(141),
            head: U256::from(150),
        };
        assert_eq!(up_to_date.checkpoint(), U256::from(141));
        assert_eq!(
            up_to_date.to_string(),
            "up to date (checkpoint 141, head 150)"
        );
    }
}
