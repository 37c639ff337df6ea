//! Request middleware: error mapping, request logging and rate limiting.

pub mod error;
pub mod logging;
pub mod rate_limit;
