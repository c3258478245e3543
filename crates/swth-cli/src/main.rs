//! swth - signed exchange actions from the command line.
//!
//! Usage:
//!   swth --config config/default.toml balances
//!   swth order SWTH_NEO buy 0.0001 1000

use anyhow::Result;
use clap::Parser;
use swth_cli::{AppConfig, Application, Command};
use swth_telemetry::init_logging_with;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "swth")]
#[command(version, about = "Signed deposits, withdrawals and orders", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config path: CLI arg > SWTH_CONFIG env > default
    let config_path = args
        .config
        .or_else(|| std::env::var("SWTH_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = AppConfig::from_file(&config_path)?;
    init_logging_with(&config.logging)?;

    info!("Starting swth v{}", env!("CARGO_PKG_VERSION"));
    info!(config = %config_path, api = %config.api_url(), "Configuration loaded");

    let app = Application::connect(&config).await?;
    let output = app.execute(args.command).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
