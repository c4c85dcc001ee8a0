//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Pick the console format from configuration
//! - Optionally mirror events to rotating `stdout.log` files
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - JSON format for production, pretty format for development
//! - Log files rotate daily; the oldest beyond `log_max_files` are removed

use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("log file setup failed: {0}")]
    Appender(#[from] InitError),

    #[error(transparent)]
    Init(#[from] TryInitError),
}

/// Default filter directives for a configured level.
pub fn default_directives(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    format!("rewrite_proxy={level},tower_http={level}")
}

/// Rotating appender for `stdout.log` files, if a log directory is configured.
pub fn file_appender(config: &ObservabilityConfig) -> Result<Option<RollingFileAppender>, InitError> {
    if config.log_dir.is_empty() {
        return Ok(None);
    }

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("stdout")
        .filename_suffix("log")
        .max_log_files(config.log_max_files)
        .build(&config.log_dir)?;
    Ok(Some(appender))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let file_layer = file_appender(config)?
        .map(|appender| fmt::layer().with_ansi(false).with_writer(appender));

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if config.log_format == "json" {
        registry.with(fmt::layer().json()).try_init()?;
    } else {
        registry.with(fmt::layer()).try_init()?;
    }
    Ok(())
}
