//! Logging setup for stage workers
//!
//! Logs go to stderr; stdout is reserved for the outgoing payload. The
//! filter comes from `RUST_LOG` (default `info`) and the output format
//! from `STAGECHAIN_LOG_FORMAT` (`text` or `json`).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::Result;

/// Environment variable selecting the log format
pub const LOG_FORMAT_ENV: &str = "STAGECHAIN_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse a format name; unknown names fall back to text
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    /// Format selected by `STAGECHAIN_LOG_FORMAT`
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}

/// Initialize logging with the format from the environment
///
/// This should be called once at worker startup.
pub fn init() -> Result<()> {
    init_with(LogFormat::from_env())
}

/// Initialize logging with an explicit format
pub fn init_with(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
    }

    tracing::debug!(?format, "logging initialized");
    Ok(())
}
