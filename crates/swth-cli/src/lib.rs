//! `swth` command-line client.
//!
//! Loads a TOML config, connects a [`swth_actions::Session`] and runs one
//! command, printing the exchange's answer as JSON.

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, Command};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
