//! Structured logging for the indexer.
//!
//! Built on `tracing`: the sync engine opens a span per pass and per batch,
//! the HTTP layer logs every request, and everything else emits key-value
//! events under those spans.
//!
//! # Environment Configuration
//!
//! ```bash
//! # Component-specific levels (default: transfer_indexer=info,warn)
//! RUST_LOG=transfer_indexer=debug,sqlx=warn transfer-indexer serve
//!
//! # JSON console output for log aggregation
//! LOG_JSON=true transfer-indexer sync
//!
//! # Additionally write JSON logs to a daily-rotated file
//! LOG_FILE=./logs/indexer.log transfer-indexer serve
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use eyre::WrapErr;
use tracing::info;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when neither `RUST_LOG` nor an explicit level is given.
pub const DEFAULT_FILTER: &str = "transfer_indexer=info,warn";

/// Resolve the active filter: `RUST_LOG`, then `log_level`, then [`DEFAULT_FILTER`].
#[must_use]
pub fn build_filter(rust_log: Option<&str>, log_level: Option<&str>) -> EnvFilter {
    rust_log
        .or(log_level)
        .map_or_else(|| EnvFilter::new(DEFAULT_FILTER), EnvFilter::new)
}

/// Open a daily-rotated, non-blocking writer for `path`, creating its directory.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created.
pub fn file_writer(path: &Path) -> eyre::Result<(NonBlocking, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .wrap_err_with(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(
        dir,
        path.file_name().unwrap_or_else(|| OsStr::new("indexer.log")),
    );

    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global tracing subscriber.
///
/// Console output is pretty-printed, or JSON when `json_output` is set.
/// With `log_file`, a second JSON layer writes to a daily-rotated file; the
/// returned guard flushes it and must be held until the process exits.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init_tracing(
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    json_output: bool,
) -> eyre::Result<Option<WorkerGuard>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_filter = build_filter(rust_log.as_deref(), log_level.as_deref());

    let console_layer = if json_output {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let (file_layer, guard) = match log_file.as_deref() {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .wrap_err("Failed to install tracing subscriber")?;

    info!(
        json_output,
        file_logging = log_file.is_some(),
        "Tracing initialized"
    );

    Ok(guard)
}

/// Route logs to the test harness; see them with `cargo test -- --nocapture`.
#[cfg(test)]
pub fn init_test_tracing() {
    use tracing_subscriber::fmt::format::FmtSpan;

    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_precedence() {
        let default = build_filter(None, None).to_string();
        assert!(default.contains("transfer_indexer=info"));
        assert_eq!(build_filter(None, Some("debug")).to_string(), "debug");
        assert_eq!(
            build_filter(Some("sqlx=trace"), Some("debug")).to_string(),
            "sqlx=trace"
        );
    }

    #[test]
    fn test_file_writer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("indexer.log");

        let (_writer, _guard) = file_writer(&path).unwrap();
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        init_test_tracing();
        assert!(init_tracing(None, None, false).is_err());
    }
}
