//! Logging infrastructure for Stem Splitter.
//!
//! This module provides:
//! - Global `tracing` subscriber setup (stderr, plus a rolling log file)
//! - Message prefixes for the GUI log panel
//! - Progress throttling so the log panel is not flooded
//!
//! # Example
//!
//! ```no_run
//! use stem_core::logging::{init_tracing_with_file, LogLevel};
//!
//! // Keep the guard alive for the lifetime of the program
//! let _guard = init_tracing_with_file(LogLevel::Info, ".logs");
//! tracing::info!("ready");
//! ```

mod throttle;
mod types;

use std::path::Path;

pub use throttle::ProgressThrottle;
pub use types::{LogLevel, MessagePrefix};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name prefix for the rolling application log.
const LOG_FILE_PREFIX: &str = "stem-splitter.log";

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr with timestamps
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(env_filter(default_level))
        .try_init();
}

/// Initialize tracing with stderr output and a daily rolling file in `logs_dir`.
///
/// Returns the writer guard; dropping it flushes and stops the file writer.
/// If the directory cannot be created, falls back to stderr only and returns
/// `None`.
pub fn init_tracing_with_file(
    default_level: LogLevel,
    logs_dir: impl AsRef<Path>,
) -> Option<WorkerGuard> {
    let logs_dir = logs_dir.as_ref();
    if let Err(e) = std::fs::create_dir_all(logs_dir) {
        init_tracing(default_level);
        tracing::warn!("Cannot create logs folder {}: {}", logs_dir.display(), e);
        return None;
    }

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(env_filter(default_level))
        .try_init();

    Some(guard)
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()))
}
