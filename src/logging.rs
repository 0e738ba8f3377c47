//! Logging setup.
//!
//! Console output always; with a log directory, also a daily-rotating
//! `sparkify-lake.<date>.log` holding everything and an `error.<date>.log`
//! holding warnings and errors only.
//!
//! The level defaults to `info` and can be overridden through `RUST_LOG`
//! (for example `RUST_LOG=sparkify_lake=debug` to see join-drop counts).

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const LOG_FILE_PREFIX: &str = "sparkify-lake";
const MAX_LOG_FILES: usize = 10;

/// Platform data directory for log files
///
/// - Linux: `~/.local/share/sparkify-lake/logs`
/// - macOS: `~/Library/Application Support/sparkify-lake/logs`
/// - Windows: `%APPDATA%/sparkify-lake/logs`
pub fn default_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    Ok(base_dir.join(LOG_FILE_PREFIX).join("logs"))
}

fn rolling_appender(log_dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("Failed to create {prefix} log appender"))
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns error if the log directory cannot be created, an appender fails,
/// or a subscriber is already installed.
pub fn init(log_dir: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    let (all_logs_layer, error_logs_layer) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create log directory: {}", dir.display())
            })?;

            let all_logs = fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
                .with_writer(rolling_appender(dir, LOG_FILE_PREFIX)?);

            let error_logs = fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
                .with_writer(rolling_appender(dir, "error")?)
                .with_filter(EnvFilter::new("warn"));

            (Some(all_logs), Some(error_logs))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(dir) = log_dir {
        tracing::info!("Logging initialized, log directory: {}", dir.display());
    }

    Ok(())
}
