//! Structured logging and tracing for Amber Monitor
//!
//! Console output plus an optional daily-rotated log file, both driven by the
//! tracing ecosystem. `RUST_LOG` overrides the configured level.

use crate::config::LoggingConfig;
use crate::error::{MonitorError, Result};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Once;
use tracing::{Level, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod level;
mod structured;

pub use level::{min_level, parse_log_level};
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

/// Set to skip the file appender entirely
pub const DISABLE_FILE_LOG_ENV: &str = "AMBER_MONITOR_DISABLE_FILE_LOG";

// Keep the non-blocking worker guard alive for the entire process lifetime
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
static INIT_ONCE: Once = Once::new();
static INIT_ERROR: OnceCell<String> = OnceCell::new();

/// Initialize logging system based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let init_result = (|| -> Result<()> {
            let level = parse_log_level(&config.level)?;
            let filter = build_env_filter(level);

            if should_use_console_only() {
                init_console_only_logging(filter, config.json_format, level);
                return Ok(());
            }

            init_file_logging(config, filter, level)
        })();

        if let Err(e) = init_result {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(MonitorError::config(err.clone()));
    }
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "amber_monitor={},tower_http={},reqwest=warn,hyper=warn",
            level,
            min_level(level, Level::INFO)
        )
        .into()
    })
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os(DISABLE_FILE_LOG_ENV).is_some()
}

/// Logs go to stderr so report output on stdout stays machine-readable
fn console_layer<S>(json_format: bool, level: Level) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);
    if json_format {
        layer.json().with_filter(LevelFilter::from_level(level)).boxed()
    } else {
        layer.with_filter(LevelFilter::from_level(level)).boxed()
    }
}

fn init_console_only_logging(filter: EnvFilter, json_format: bool, level: Level) {
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer(json_format, level))
        .try_init();

    info!("Logging initialized - level: {:?}, console-only", level);
}

fn init_file_logging(config: &LoggingConfig, filter: EnvFilter, level: Level) -> Result<()> {
    let file_appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix("amber_monitor")
        .filename_suffix("log")
        .max_log_files(config.backup_count.max(1) as usize)
        .build({
            // If config.file is a file path, use its parent dir; otherwise treat as dir
            let p = Path::new(&config.file);
            if p.extension().is_some() {
                p.parent().unwrap_or(p)
            } else {
                p
            }
        })
        .map_err(|e| MonitorError::io(format!("Failed to create log file appender: {}", e)))?;

    let (non_blocking_appender, guard) = non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let file_layer = {
        let base = fmt::layer()
            .with_writer(non_blocking_appender)
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if config.json_format {
            base.json().with_filter(LevelFilter::from_level(level)).boxed()
        } else {
            base.with_filter(LevelFilter::from_level(level)).boxed()
        }
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(file_layer);

    let init = if config.console_output {
        subscriber
            .with(console_layer(config.json_format, level))
            .try_init()
    } else {
        subscriber.try_init()
    };
    init.map_err(|e| MonitorError::config(format!("Failed to install subscriber: {}", e)))?;

    info!(
        "Logging initialized - level: {:?}, file: {}",
        level, config.file
    );
    Ok(())
}
