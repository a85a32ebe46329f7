//! Log sink setup for applications embedding the bridge.
//!
//! The bridge itself only emits `tracing` events. [`init`] persists them to a
//! rotating log file that keeps the last [`LoggingConfig::max_files`] files.

use std::fs;
use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::config::{LogRotation, LoggingConfig};
use crate::{Error, Result};

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" | "critical" => Level::ERROR,
        _ => Level::INFO,
    }
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Minutely => Rotation::MINUTELY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Rolling appender for `config.file`.
///
/// Rotated files are named after the configured file with the period
/// appended (`bridge.log.2024-05-01`); older ones beyond `max_files` are
/// removed on rotation.
pub fn rolling_file_appender(config: &LoggingConfig) -> Result<RollingFileAppender> {
    let path = Path::new(&config.file);
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Config(format!("logging.file {:?} has no file name", config.file)))?;
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    fs::create_dir_all(directory)?;

    RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(file_name)
        .max_log_files(config.max_files.max(1))
        .build(directory)
        .map_err(|e| Error::Config(format!("cannot open log file {:?}: {e}", config.file)))
}

/// Install a global subscriber writing to stdout and the rotating log file.
///
/// File writes go through a background worker; keep the returned guard alive
/// for as long as the application logs, dropping it flushes pending records.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    let level = parse_level(&config.level);
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let (file_writer, guard) = tracing_appender::non_blocking(rolling_file_appender(config)?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter)
        .init();

    Ok(guard)
}

/// Console-only logging, for development.
pub fn init_console_only(level: &str) {
    let filter = EnvFilter::from_default_env().add_directive(parse_level(level).into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(filter)
        .init();
}
