//! # ERC-20 Transfer Indexer
//!
//! Incrementally ingests `Transfer(address,address,uint256)` logs for one
//! token contract into SQLite and serves them through a small read-only
//! HTTP API. Built on [Alloy](https://github.com/alloy-rs/alloy), Tokio,
//! sqlx and axum.
//!
//! ## Features
//!
//! - **Resumable sync**: a single checkpoint row records the next block to index
//! - **Confirmation lag**: only blocks at least `CONFIRMATION_BLOCKS` deep are indexed
//! - **Idempotent writes**: transfers are keyed by transaction hash and never rewritten
//! - **Arbitrary precision**: block numbers and values are `U256` end to end
//! - **Read API** with OpenAPI docs, rate limiting and CORS
//!
//! ## Architecture
//!
//! Layers, leaves first; no module depends on one listed after it:
//!
//! 1. [`error`], [`config`], [`observability`]: ambient plumbing
//! 2. [`events`]: `sol!`-generated event type and log decoding
//! 3. [`db`]: SQLite pool, schema and [`db::repository::Repository`]
//! 4. [`rpc`]: HTTP provider and the [`rpc::EventLogSource`] seam
//! 5. [`sync`]: batch arithmetic, storage seams and the [`sync::SyncEngine`]
//! 6. [`api`], [`app_state`]: the axum Read API
//! 7. [`cli`]: command-line wiring
//!
//! ## Quick Start
//!
//! ```bash
//! export RPC_URL=https://eth-mainnet.g.alchemy.com/v2/KEY
//! export TOKEN_ADDRESS=0xdAC17F958D2ee523a2206206994597C13D831ec7
//! export START_BLOCK=19000000
//!
//! # One pass, then exit
//! cargo run --release -- sync
//!
//! # Continuous sync + API on :3000
//! cargo run --release -- serve
//! curl 'localhost:3000/transfers?limit=5'
//! ```
//!
//! ## Using as a Library
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use transfer_indexer::config::Config;
//! use transfer_indexer::db::{create_pool, repository::Repository};
//! use transfer_indexer::rpc::{create_provider, AlloyLogSource};
//! use transfer_indexer::sync::{SqliteCheckpointStore, SyncEngine, SyncMode, SyncSettings};
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let config = Config::from_env()?;
//!     let repository = Repository::new(create_pool(config.database_url()).await?);
//!     let provider = create_provider(config.rpc_url()).await?;
//!
//!     let engine = SyncEngine::new(
//!         Arc::new(AlloyLogSource::new(provider, config.token_address())),
//!         Arc::new(SqliteCheckpointStore::new(repository.clone(), config.start_block())),
//!         Arc::new(repository),
//!         SyncSettings::from(&config),
//!     );
//!     let outcome = engine.run(SyncMode::OneShot).await?;
//!     println!("{outcome}");
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`error::IndexerResult<T>`](error::IndexerResult).
//! RPC and database failures are transient and retried by the engine;
//! configuration errors are fatal at startup.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod app_state;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod observability;
pub mod rpc;
pub mod sync;
