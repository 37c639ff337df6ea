//! Error types for the transfer indexer.
//!
//! This module provides a unified error type [`IndexerError`] covering every
//! failure the indexer can hit while loading configuration, talking to the
//! chain, decoding logs and persisting rows.
//!
//! # Design
//!
//! The error hierarchy is organized by layer:
//! - [`IndexerError::ConfigError`]: missing or malformed settings (fatal at startup)
//! - [`IndexerError::RpcError`]: RPC provider and network errors (transient)
//! - [`IndexerError::DatabaseError`]: storage errors (transient)
//! - [`IndexerError::DecodingError`]: malformed log entries (the entry is skipped)
//! - [`IndexerError::SyncError`]: engine invariant violations (not retried)
//!
//! All errors implement [`std::error::Error`] and include rich context via
//! the source error chain.
//!
//! # Example
//!
//! ```
//! use transfer_indexer::error::{IndexerError, IndexerResult};
//!
//! fn validate_batch_size(batch_size: u64) -> IndexerResult<()> {
//!     if batch_size == 0 {
//!         return Err(IndexerError::config("BATCH_SIZE must be at least 1", None));
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt;

/// Result type alias using [`IndexerError`].
pub type IndexerResult<T> = Result<T, IndexerError>;

/// Boxed source error carried by most variants.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type for the transfer indexer.
#[derive(Debug)]
pub enum IndexerError {
    /// Configuration or environment variable errors.
    ///
    /// Variants include:
    /// - Missing required environment variables
    /// - Invalid addresses or URLs
    /// - Malformed numeric values
    ConfigError {
        /// Human-readable error message
        message: String,
        /// Optional underlying error
        source: Option<BoxedSource>,
    },

    /// RPC provider or network errors.
    ///
    /// Variants include:
    /// - Failed to reach the provider
    /// - Request timeout or rate limiting
    /// - Block number outside the provider's range
    RpcError {
        /// Human-readable error message
        message: String,
        /// Optional underlying error
        source: Option<BoxedSource>,
    },

    /// Event decoding or parsing errors.
    ///
    /// Variants include:
    /// - Topic layout does not match the Transfer event
    /// - Missing block number on a log
    /// - Stored numeric text that does not parse
    DecodingError {
        /// Human-readable error message
        message: String,
        /// Optional underlying error
        source: Option<BoxedSource>,
    },

    /// Database operation errors.
    ///
    /// Variants include:
    /// - Connection failures
    /// - Query execution errors
    /// - Schema setup failures
    /// - Transaction errors
    DatabaseError {
        /// Human-readable error message
        message: String,
        /// Optional underlying error
        source: Option<BoxedSource>,
    },

    /// Sync engine invariant violations.
    ///
    /// Raised when continuing would risk moving the checkpoint past
    /// unprocessed blocks, for example on a corrupt stored checkpoint.
    SyncError {
        /// Human-readable error message
        message: String,
        /// Optional underlying error
        source: Option<BoxedSource>,
    },
}

impl IndexerError {
    /// Create a new configuration error.
    ///
    /// # Example
    ///
    /// ```
    /// use transfer_indexer::error::IndexerError;
    ///
    /// let err = IndexerError::config("RPC_URL not set", None);
    /// assert!(matches!(err, IndexerError::ConfigError { .. }));
    /// ```
    #[must_use]
    pub fn config(message: impl Into<String>, source: Option<BoxedSource>) -> Self {
        Self::ConfigError {
            message: message.into(),
            source,
        }
    }

    /// Create a new RPC error.
    ///
    /// # Example
    ///
    /// ```
    /// use transfer_indexer::error::IndexerError;
    ///
    /// let err = IndexerError::rpc("Failed to connect to provider", None);
    /// assert!(matches!(err, IndexerError::RpcError { .. }));
    /// ```
    #[must_use]
    pub fn rpc(message: impl Into<String>, source: Option<BoxedSource>) -> Self {
        Self::RpcError {
            message: message.into(),
            source,
        }
    }

    /// Create a new decoding error.
    #[must_use]
    pub fn decoding(message: impl Into<String>, source: Option<BoxedSource>) -> Self {
        Self::DecodingError {
            message: message.into(),
            source,
        }
    }

    /// Create a new database error.
    ///
    /// # Example
    ///
    /// ```
    /// use transfer_indexer::error::IndexerError;
    ///
    /// let err = IndexerError::database("Connection failed", None);
    /// assert!(matches!(err, IndexerError::DatabaseError { .. }));
    /// ```
    #[must_use]
    pub fn database(message: impl Into<String>, source: Option<BoxedSource>) -> Self {
        Self::DatabaseError {
            message: message.into(),
            source,
        }
    }

    /// Create a new sync engine error.
    #[must_use]
    pub fn sync(message: impl Into<String>, source: Option<BoxedSource>) -> Self {
        Self::SyncError {
            message: message.into(),
            source,
        }
    }

    /// Whether retrying the same operation may succeed.
    ///
    /// RPC and database failures are transient. Configuration, decoding and
    /// engine invariant errors will fail the same way on every attempt.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::RpcError { .. } | Self::DatabaseError { .. })
    }
}

impl fmt::Display for IndexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError { message, .. } => write!(f, "Configuration error: {message}"),
            Self::RpcError { message, .. } => write!(f, "RPC error: {message}"),
            Self::DecodingError { message, .. } => write!(f, "Decoding error: {message}"),
            Self::DatabaseError { message, .. } => write!(f, "Database error: {message}"),
            Self::SyncError { message, .. } => write!(f, "Sync error: {message}"),
        }
    }
}

impl std::error::Error for IndexerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigError { source, .. }
            | Self::RpcError { source, .. }
            | Self::DecodingError { source, .. }
            | Self::DatabaseError { source, .. }
            | Self::SyncError { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &dyn std::error::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_config_error() {
        let err = IndexerError::config("test error", None);
        assert!(matches!(err, IndexerError::ConfigError { .. }));
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_rpc_error() {
        let err = IndexerError::rpc("connection failed", None);
        assert!(matches!(err, IndexerError::RpcError { .. }));
        assert_eq!(err.to_string(), "RPC error: connection failed");
    }

    #[test]
    fn test_decoding_error() {
        let err = IndexerError::decoding("invalid log", None);
        assert_eq!(err.to_string(), "Decoding error: invalid log");
    }

    #[test]
    fn test_sync_error() {
        let err = IndexerError::sync("corrupt checkpoint", None);
        assert_eq!(err.to_string(), "Sync error: corrupt checkpoint");
    }

    #[test]
    fn test_transient_classification() {
        assert!(IndexerError::rpc("timeout", None).is_transient());
        assert!(IndexerError::database("locked", None).is_transient());
        assert!(!IndexerError::config("missing", None).is_transient());
        assert!(!IndexerError::decoding("bad topic", None).is_transient());
        assert!(!IndexerError::sync("corrupt", None).is_transient());
    }

    #[test]
    fn test_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = IndexerError::config("failed to load", Some(Box::new(source)));

        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Configuration error: failed to load");
    }
}
