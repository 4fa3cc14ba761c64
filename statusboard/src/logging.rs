//! Logging configuration using tracing
//!
//! The terminal belongs to the dashboard, so logs only ever go to a file,
//! and only when asked for.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable enabling logging and holding its filter.
pub const LOG_ENV: &str = "STATUSBOARD_LOG";

const DEFAULT_FILTER: &str = "statusboard=info,warn";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/statusboard/logs/`, rotated daily.
/// Nothing is logged unless `STATUSBOARD_LOG` is set; its value is used as
/// the filter, falling back to `statusboard=info,warn` if it does not parse.
///
/// # Examples
/// ```bash
/// STATUSBOARD_LOG=debug statusboard status.txt systemlog.txt
/// STATUSBOARD_LOG=statusboard::tail=trace statusboard status.txt systemlog.txt
/// ```
///
/// Returns whether a subscriber was installed.
pub fn init() -> Result<bool> {
    let directives = match std::env::var(LOG_ENV) {
        Ok(directives) => directives,
        Err(_) => return Ok(false),
    };

    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "statusboard.log");

    let env_filter =
        EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("statusboard {} starting", env!("CARGO_PKG_VERSION"));
        tracing::info!("Log directory: {}", log_dir.display());
    }
    Ok(installed)
}

/// Directory the log files are written to.
pub fn log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("statusboard").join("logs")
}
