//! Tracing setup for harvest runs
//!
//! - Console output on stderr (stdout is reserved for the harvested JSON)
//! - Optional file output next to the executable, with old-file cleanup
//! - Optional structured JSON format
//! - `RUST_LOG` overrides the configured filter entirely

use anyhow::{Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

const LOG_FILE_NAME: &str = "wishlist-harvest.log";

// File writer guards live for the whole process; dropping one stops its flush thread
lazy_static! {
    static ref FILE_WRITER_GUARDS: Mutex<Vec<WorkerGuard>> = Mutex::new(Vec::new());
}

/// Local wall-clock timestamps with millisecond precision
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// `logs/` beside the running binary, or under the working directory when
/// the executable path is unknown
pub fn get_log_directory() -> PathBuf {
    let base = match std::env::current_exe() {
        Ok(exe) => exe.parent().map(Path::to_path_buf),
        Err(_) => None,
    };

    base.or_else(|| std::env::current_dir().ok())
        .unwrap_or_default()
        .join("logs")
}

/// Build the filter from `RUST_LOG`, falling back to the configured level
/// plus per-module overrides that quiet the browser protocol chatter.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    // Sorted so the resulting filter does not depend on map iteration order
    let mut modules: Vec<_> = config.module_filters.iter().collect();
    modules.sort();
    for (module, level) in modules {
        let directive = format!("{module}={level}")
            .parse()
            .map_err(|e| anyhow!("Invalid log filter '{}={}': {}", module, level, e))?;
        filter = filter.add_directive(directive);
    }

    Ok(filter)
}

/// Install the global subscriber described by `config`.
///
/// A second call reports an error from `try_init` instead of panicking,
/// which callers may ignore.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    if !config.file_output && !config.console_output {
        return Err(anyhow!("Logging needs console_output or file_output enabled"));
    }

    let env_filter = build_env_filter(config)?;

    let console_layer = config.console_output.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stderr)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
            .boxed()
    });

    let log_dir = get_log_directory();
    let file_layer = if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Cannot create {}: {}", log_dir.display(), e))?;
        cleanup_old_logs(&log_dir, config.max_files)?;

        let (file_writer, guard) = non_blocking(rolling::daily(&log_dir, LOG_FILE_NAME));
        FILE_WRITER_GUARDS
            .lock()
            .map_err(|_| anyhow!("File writer guard registry poisoned"))?
            .push(guard);

        let layer = if config.json_format {
            fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .boxed()
        } else {
            fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .with_ansi(false)
                .boxed()
        };
        Some(layer)
    } else {
        None
    };

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install global subscriber: {}", e))?;

    if config.file_output {
        info!(
            "📝 Tracing ready (level {}, files in {}, json {})",
            config.level,
            log_dir.display(),
            config.json_format
        );
    } else {
        info!("📝 Tracing ready (level {}, console only)", config.level);
    }

    Ok(())
}

/// Remove the oldest log files so at most `max_files` remain
pub fn cleanup_old_logs(log_dir: &Path, max_files: u32) -> Result<usize> {
    if !log_dir.is_dir() {
        return Ok(0);
    }

    let mut rotated = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_NAME));
        if path.is_file() && is_log {
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                rotated.push((path, modified));
            }
        }
    }

    // Newest first
    rotated.sort_by_key(|(_, modified)| std::cmp::Reverse(*modified));

    let mut removed = 0;
    for (path, _) in rotated.iter().skip(max_files as usize) {
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not remove rotated log {}: {}", path.display(), e),
        }
    }

    if removed > 0 {
        info!("Removed {} old log files (keeping {})", removed, max_files);
    }

    Ok(removed)
}
