//! Read-only HTTP API over the indexed transfers.
//!
//! The API never writes and never reads the checkpoint; it runs beside the
//! sync engine and only observes the `transfer` table.

pub mod docs;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod server;

pub use server::{build_router, run_server};
