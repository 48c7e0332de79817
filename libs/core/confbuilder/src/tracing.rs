use crate::level::Level;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, prelude::*};
use validator::{Validate, ValidationError};

/// Output format of the process logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// `"json"` selects JSON; anything else, including `""`, is text.
    pub fn parse_lossy(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Logger configuration, loadable with the [`Builder`](crate::Builder).
///
/// Environment variables (tag key `env`):
/// - `LOG_FORMAT`: `text` (default) or `json`
/// - `LOG_LEVEL`: `DEBUG`, `INFO` (default), `WARN`, `ERROR`, optionally with an offset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, crate::EnvConfig)]
#[serde(default)]
pub struct LogConfig {
    #[tag(env = "LOG_FORMAT")]
    #[validate(custom(function = "validate_log_format"))]
    pub format: String,

    #[tag(env = "LOG_LEVEL")]
    pub level: Level,
}

impl LogConfig {
    pub fn new(format: impl Into<String>, level: Level) -> Self {
        Self {
            format: format.into(),
            level,
        }
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse_lossy(&self.format)
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn default_filter(&self) -> EnvFilter {
        EnvFilter::new(self.level.as_filter().to_string())
    }
}

/// Accepts `""`, `"text"` and `"json"`.
pub fn validate_log_format(format: &str) -> Result<(), ValidationError> {
    match format {
        "" | "text" | "json" => Ok(()),
        _ => Err(ValidationError::new("log_format")
            .with_message("log format must be one of: text, json".into())),
    }
}

/// Install the global `tracing` subscriber described by `config`.
///
/// - `json`: one JSON object per event, flattened, without module targets
/// - `text` (and unrecognized values): human-readable lines
///
/// `RUST_LOG` overrides the configured level. An `ErrorLayer` is included so
/// errors can capture span traces.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place and return `false`.
pub fn init_tracing(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| config.default_filter());

    let result = match config.log_format() {
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init(),
    };

    match result {
        Ok(()) => {
            info!(format = ?config.log_format(), level = %config.level, "Tracing initialized");
            true
        }
        Err(_) => {
            debug!("Tracing already initialized, skipping re-initialization");
            false
        }
    }
}
