//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wallet error: {0}")]
    Wallet(#[from] swth_signer::SignerError),

    #[error("Registry error: {0}")]
    Registry(#[from] swth_registry::RegistryError),

    #[error(transparent)]
    Action(#[from] swth_actions::ActionError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] swth_telemetry::TelemetryError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
