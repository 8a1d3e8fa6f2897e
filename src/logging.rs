//! Tracing setup for batch runs.
//!
//! The warehouse logs one event per refresh step at `info`, with `source`
//! (Bronze) or `entity` (Silver), row counts and `elapsed_ms`. Rejected
//! extracts and failed quality checks are logged at `warn`; per-rule row
//! counts (rows dropped for a missing `cst_id`, unresolved fact references)
//! at `debug`. Events go to stderr and to daily-rotated files, so stdout
//! stays free for run summaries and quality reports.
//!
//! ```no_run
//! medallion::logging::init().expect("Failed to initialize logging");
//! tracing::info!(source = "crm_cust_info", rows = 18494, "Source loaded");
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Overrides the log directory, e.g. for a scheduler that collects logs
pub const LOG_DIR_ENV: &str = "MEDALLION_LOG_DIR";

/// Rotated files kept per log
const KEEP_LOG_FILES: usize = 10;

/// Directory the run logs are written to, created if missing.
///
/// `MEDALLION_LOG_DIR` wins; otherwise `medallion/logs` under the platform
/// data directory (`~/.local/share` on Linux, `%APPDATA%` on Windows).
pub fn log_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::data_dir()
            .context("Failed to determine data directory")?
            .join("medallion")
            .join("logs"),
    };
    ensure_dir(&dir)?;
    Ok(dir)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    }
    Ok(())
}

fn rolling_appender(dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(KEEP_LOG_FILES)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(dir)
        .with_context(|| format!("Failed to create {prefix}.log appender"))
}

/// Install the subscriber: stderr plus `medallion.log` (everything passing
/// the filter) and `error.log` (rejected extracts, failed checks).
///
/// # Errors
///
/// Returns error if the log directory or an appender cannot be created, or a
/// subscriber is already installed
pub fn init() -> Result<()> {
    let log_dir = log_dir()?;
    let all_logs_appender = rolling_appender(&log_dir, "medallion")?;
    let error_logs_appender = rolling_appender(&log_dir, "error")?;

    // Default to INFO, allow override with RUST_LOG
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .compact();

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(all_logs_appender);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(error_logs_appender)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(log_dir = %log_dir.display(), "Logging initialized");

    Ok(())
}
