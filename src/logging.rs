//! Structured logging infrastructure.
//!
//! Uses `tracing` and `tracing-subscriber` for async-aware structured
//! logging with environment-based filtering. The configured level acts as
//! the default; a `RUST_LOG` environment variable takes precedence, so a
//! deployment can raise verbosity for a single module without touching the
//! configuration file.

use crate::config::ApplicationSettings;
use crate::error::WatchError;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-oriented format with colors (development).
    Pretty,
    /// Single-line format without colors (production terminals).
    Compact,
    /// JSON lines for log aggregation.
    Json,
}

impl OutputFormat {
    /// Parse a configuration string into an output format.
    pub fn parse(format: &str) -> Result<Self, WatchError> {
        match format.to_lowercase().as_str() {
            "pretty" => Ok(OutputFormat::Pretty),
            "compact" => Ok(OutputFormat::Compact),
            "json" => Ok(OutputFormat::Json),
            other => Err(WatchError::Tracing(format!(
                "Invalid log format '{}'. Must be one of: pretty, compact, json",
                other
            ))),
        }
    }
}

/// Install the global tracing subscriber from application settings.
///
/// Idempotent: calling it when a subscriber is already installed (as
/// happens across tests) is not an error.
pub fn init(settings: &ApplicationSettings) -> Result<(), WatchError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let format = OutputFormat::parse(&settings.log_format)?;

    let result = match format {
        OutputFormat::Pretty => {
            let fmt_layer = fmt::layer().with_target(true).with_filter(env_filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
        OutputFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_ansi(false)
                .with_filter(env_filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
        OutputFormat::Json => {
            let fmt_layer = fmt::layer().json().with_filter(env_filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
    };

    result.or_else(|e| {
        // A second init (tests, embedding) finds the global dispatcher
        // already set; that is fine.
        if e.to_string()
            .contains("a global default trace dispatcher has already been set")
        {
            Ok(())
        } else {
            Err(WatchError::Tracing(format!(
                "Failed to initialize tracing: {}",
                e
            )))
        }
    })
}
