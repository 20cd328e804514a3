use crate::error::Result;
use std::path::PathBuf;
use time::macros::format_description;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "RELTREE_LOG";
pub const LOG_FILE: &str = "reltree.log";

/// Install file logging. The terminal belongs to the TUI, so nothing is logged to it.
///
/// Level comes from `RELTREE_LOG` (e.g. `RELTREE_LOG=debug`), falling back to `default_filter`.
pub fn init(default_filter: &str) -> Result<PathBuf> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE);
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));
    let timer = UtcTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_timer(timer),
        )
        .init();

    tracing::info!(dir = %log_dir.display(), "reltree starting");
    Ok(log_dir)
}

pub fn log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("reltree").join("logs")
}
