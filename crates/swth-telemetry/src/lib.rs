//! Structured logging for the exchange client.
//!
//! JSON lines in production (`RUST_ENV=production`), pretty output
//! otherwise. `RUST_LOG` overrides the configured filter.

pub mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, init_logging_with, LogFormat, LoggingConfig, DEFAULT_FILTER};
