//! Structured logging setup for the CLI
//!
//! Log lines go to stderr so command output on stdout stays pipeable.
//! `RUST_LOG` takes precedence over the configured level.

use cleanerp_core::LoggingConfig;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Error types for logging setup
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

pub type Result<T> = std::result::Result<T, LoggingError>;

/// Output flags from the command line, applied on top of the config file
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOverrides {
    pub verbose: bool,
    pub json: bool,
}

/// Effective filter directive for the CLI crates
#[must_use]
pub fn filter_directive(config: &LoggingConfig, overrides: LogOverrides) -> String {
    let level = if overrides.verbose {
        "debug"
    } else {
        config.level.as_str()
    };
    format!("warn,cleanerp_core={level},cleanerp_cli={level},cleanerp={level}")
}

/// Build the filter, preferring `RUST_LOG` when it is set and valid
///
/// # Errors
/// Returns an error if the configured directive cannot be parsed
pub fn build_filter(config: &LoggingConfig, overrides: LogOverrides) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = filter_directive(config, overrides);
    EnvFilter::try_new(&directive).map_err(|e| LoggingError::InvalidFilter {
        directive,
        reason: e.to_string(),
    })
}

/// Install the global subscriber: plain text, or JSON lines when configured
///
/// # Errors
/// Returns an error if the filter is invalid or a subscriber is already set
pub fn init_logging(config: &LoggingConfig, overrides: LogOverrides) -> Result<()> {
    let filter = build_filter(config, overrides)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json || overrides.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(overrides.verbose),
            )
            .try_init()
    };
    installed.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    debug!("Logging initialized");
    Ok(())
}
