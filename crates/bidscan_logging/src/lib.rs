//! Shared logging setup for bidscan binaries.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "bidscan=info";
const VERBOSE_LOG_FILTER: &str = "bidscan=debug";
const QUIET_LOG_FILTER: &str = "warn";

/// Logging configuration shared by bidscan binaries.
#[derive(Debug, Clone, Default)]
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Debug-level events on stderr
    pub verbose: bool,
    /// Only warnings and errors on stderr
    pub quiet: bool,
    /// Also write a daily log file under this directory
    pub log_dir: Option<&'a Path>,
}

/// Initialize tracing with stderr output and an optional rolling log file.
///
/// `RUST_LOG` overrides the default filter for both outputs. Keep the
/// returned guard alive until exit so buffered file output is flushed.
pub fn init_logging(config: LogConfig<'_>) -> Result<Option<WorkerGuard>> {
    let mut guard = None;
    let file_layer = match config.log_dir {
        Some(dir) => {
            let dir = ensure_logs_dir(dir)?;
            let file_name = format!("{}.log", sanitize_name(config.app_name));
            let appender = tracing_appender::rolling::daily(dir, file_name);
            let (writer, worker_guard) = tracing_appender::non_blocking(appender);
            guard = Some(worker_guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(file_filter()),
            )
        }
        None => None,
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter(config.verbose, config.quiet));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

fn file_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn console_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(console_directive(verbose, quiet))
}

/// Filter directive for stderr when `RUST_LOG` is unset. Verbose wins over quiet.
pub fn console_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        VERBOSE_LOG_FILTER
    } else if quiet {
        QUIET_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    }
}

/// Ensure a logs directory exists.
pub fn ensure_logs_dir(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create logs directory: {}", dir.display()))?;
    Ok(dir.to_path_buf())
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "bidscan".to_string()
    } else {
        cleaned
    }
}
