//! File-based logging. The TUI owns the terminal, so nothing is written to
//! stdout or stderr by the subscriber.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::errors::CliError;

/// Initialize the logging subsystem.
///
/// Logs are written to `<data_local_dir>/auryvia/logs/auryvia.log.<date>`.
/// The filter is read from `AURYVIA_LOG`, e.g. `AURYVIA_LOG=auryvia=trace`.
pub fn init(debug: bool) -> Result<PathBuf, CliError> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "auryvia.log");

    let default_filter = if debug { "auryvia=debug,warn" } else { "auryvia=info,warn" };
    let env_filter =
        EnvFilter::try_from_env("AURYVIA_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| CliError::Generic(format!("Failed to initialize logging: {e}")))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "auryvia starting");
    tracing::debug!("log directory: {}", log_dir.display());
    Ok(log_dir)
}

fn log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("auryvia").join("logs")
}
