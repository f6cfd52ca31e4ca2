//! Execution logging for tidycsv.
//!
//! Every run appends to `<output>/logs/tidycsv.log`. Each line carries a
//! timestamp, level, target and message. With `--verbose` the same events
//! are echoed to stderr at debug level; stdout stays reserved for the
//! progress lines printed by the CLI.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use tidycsv::logging;
//!
//! logging::init(Path::new("output"), false).expect("Failed to initialize logging");
//!
//! tracing::info!("Run started");
//! tracing::warn!("3 duplicate rows found");
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Log file name inside the log directory.
pub const LOG_FILE_NAME: &str = "tidycsv.log";

/// Returns `<output_dir>/logs`, creating it when missing.
pub fn get_log_dir(output_dir: &Path) -> Result<PathBuf> {
    let log_dir = output_dir.join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Initializes the global subscriber: append-only file log plus an
/// optional stderr echo.
///
/// `RUST_LOG` overrides the default level (`info`, or `debug` when
/// `verbose` is set).
///
/// # Errors
///
/// Returns error if the log directory or file appender cannot be created,
/// or if a global subscriber is already installed.
pub fn init(output_dir: &Path, verbose: bool) -> Result<PathBuf> {
    let log_dir = get_log_dir(output_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("tidycsv")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create log file appender")?;

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("Failed to create env filter")?;

    let file_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(file_appender);

    let console_layer = verbose.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    let log_path = log_dir.join(LOG_FILE_NAME);
    tracing::info!("Logging initialized, log file: {}", log_path.display());

    Ok(log_path)
}
