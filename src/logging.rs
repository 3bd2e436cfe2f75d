//! Logging setup
//!
//! Log lines go to stderr and, when configured, are appended to a log file.
//! `RUST_LOG` overrides the configured level. A log file that cannot be
//! opened only costs the file output.

use crate::config::LoggingConfig;
use std::fs::OpenOptions;
use std::sync::Mutex;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to install logger: {0}")]
    InitError(#[from] TryInitError),
}

/// Map a configured level name to a filter
///
/// Accepts the usual names in any case, plus `WARNING` and `CRITICAL`.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Some(LevelFilter::TRACE),
        "DEBUG" => Some(LevelFilter::DEBUG),
        "INFO" => Some(LevelFilter::INFO),
        "WARN" | "WARNING" => Some(LevelFilter::WARN),
        "ERROR" | "CRITICAL" => Some(LevelFilter::ERROR),
        "OFF" => Some(LevelFilter::OFF),
        _ => None,
    }
}

/// Install the global subscriber
///
/// `verbose` forces DEBUG regardless of the configured level.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<(), LoggingError> {
    let configured = parse_level(&config.level);
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        configured.unwrap_or(LevelFilter::INFO)
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let mut open_error = None;
    let file_layer = config.file.as_ref().and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
            Err(e) => {
                open_error = Some(format!("{}: {}", path.display(), e));
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    if let Some(e) = open_error {
        warn!("Log file unavailable, logging to stderr only ({})", e);
    }
    if configured.is_none() {
        warn!("Unknown log level '{}', using INFO", config.level);
    }
    Ok(())
}
