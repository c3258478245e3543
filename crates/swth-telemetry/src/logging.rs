//! Structured logging initialization.

use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{TelemetryError, TelemetryResult};

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "info,swth=debug";

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable multi-line output (development).
    #[default]
    Pretty,
    /// One JSON object per event (production).
    Json,
}

impl LogFormat {
    /// `Json` when `RUST_ENV=production`, `Pretty` otherwise.
    pub fn from_env() -> Self {
        match std::env::var("RUST_ENV") {
            Ok(v) if v == "production" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging settings, usually the `[logging]` table of the app config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Unset means "decide from `RUST_ENV`".
    #[serde(default)]
    pub format: Option<LogFormat>,
}

fn default_filter() -> String {
    DEFAULT_FILTER.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: None,
        }
    }
}

impl LoggingConfig {
    fn resolved_format(&self) -> LogFormat {
        self.format.unwrap_or_else(LogFormat::from_env)
    }

    fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.filter).map_err(|e| TelemetryError::InvalidFilter {
            filter: self.filter.clone(),
            reason: e.to_string(),
        })
    }
}

/// Initialize logging with defaults.
pub fn init_logging() -> TelemetryResult<()> {
    init_logging_with(&LoggingConfig::default())
}

/// Initialize the global subscriber.
///
/// # Errors
/// - `InvalidFilter` if the configured filter does not parse
/// - `LoggingInit` if a global subscriber is already installed
pub fn init_logging_with(config: &LoggingConfig) -> TelemetryResult<()> {
    let env_filter = config.env_filter()?;
    let format = config.resolved_format();

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(true))
            .try_init(),
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    debug!(?format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_table() {
        let config: LoggingConfig = toml::from_str("").unwrap();
        assert_eq!(config, LoggingConfig::default());
        assert_eq!(config.filter, DEFAULT_FILTER);
    }

    #[test]
    fn test_explicit_format_wins() {
        let config: LoggingConfig = toml::from_str(r#"format = "json""#).unwrap();
        assert_eq!(config.resolved_format(), LogFormat::Json);
    }

    #[test]
    fn test_second_init_is_an_error() {
        // The first call may race other tests for the global slot; the
        // second one can never succeed.
        let _ = init_logging();
        assert!(matches!(
            init_logging(),
            Err(TelemetryError::LoggingInit(_)) | Err(TelemetryError::InvalidFilter { .. })
        ));
    }
}
