//! Checkpointed synchronization of `Transfer` logs into storage.
//!
//! - [`range`]: safe-head and batch arithmetic over `U256` block numbers
//! - [`store`]: checkpoint and transfer storage traits with their implementations
//! - [`engine`]: the [`SyncEngine`] that ties source, stores and settings together

pub mod engine;
pub mod range;
pub mod store;

pub use engine::{BatchStats, PassOutcome, PassSummary, SyncEngine, SyncMode, SyncSettings};
pub use range::{batches, safe_head, BlockRange};
pub use store::{CheckpointStore, MemoryCheckpointStore, SqliteCheckpointStore, TransferRepository};
