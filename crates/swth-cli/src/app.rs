//! Application wiring and command dispatch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use swth_actions::{OrderSize, Session};
use swth_core::{Pair, Side};
use swth_registry::{ExchangeApi, RestClient};
use swth_signer::Wallet;
use tracing::info;

use crate::config::AppConfig;
use crate::error::AppResult;

/// One exchange operation.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Show the wallet address and the resolved contract.
    Info,
    /// Deposit an asset into the exchange contract.
    Deposit {
        /// Token symbol (e.g. NEO).
        asset: String,
        amount: Decimal,
    },
    /// Withdraw an asset from the exchange contract.
    Withdraw { asset: String, amount: Decimal },
    /// Create, sign and broadcast a limit order.
    Order {
        /// Pair as TRADE_BASE (e.g. SWTH_NEO).
        pair: Pair,
        side: Side,
        price: Decimal,
        /// Amount of the trade token, or of the base asset with `--base`.
        amount: Decimal,
        /// Amount is in the base asset and sent as the want amount unchanged.
        #[arg(long)]
        base: bool,
        /// Do not pay fees in the native token.
        #[arg(long)]
        no_native_tokens: bool,
    },
    /// Cancel an open order.
    Cancel { order_id: String },
    /// List executed trades.
    Trades {
        pair: Pair,
        /// Range start (RFC 3339).
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Range end (RFC 3339).
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Contract balances of this wallet or another address.
    Balances {
        #[arg(long)]
        address: Option<String>,
    },
}

/// Main application.
pub struct Application {
    session: Session,
}

impl Application {
    /// Build the REST client, load the wallet and connect a session.
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        let client = RestClient::with_timeout(config.api_url(), config.request_timeout())?;
        info!(base_url = %client.base_url(), "Exchange client ready");
        Self::with_api(Arc::new(client), config).await
    }

    /// Connect over an existing transport.
    pub async fn with_api(api: Arc<dyn ExchangeApi>, config: &AppConfig) -> AppResult<Self> {
        let wallet = Wallet::load(&config.key)?;
        let session = Session::connect(api, wallet, config.session_config()).await?;
        Ok(Self { session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run one command and return the exchange's answer as JSON.
    pub async fn execute(&self, command: Command) -> AppResult<Value> {
        let session = &self.session;

        let output = match command {
            Command::Info => {
                let contract = session.contract();
                json!({
                    "address": session.wallet().address(),
                    "exchange_address": session.wallet().exchange_address(),
                    "can_sign": session.can_sign(),
                    "blockchain": contract.chain,
                    "contract_version": contract.version,
                    "contract_hash": contract.hash,
                    "timestamp_mode": format!("{:?}", session.timestamp_mode()),
                })
            }
            Command::Deposit { asset, amount } => session.deposit(&asset, amount).await?,
            Command::Withdraw { asset, amount } => {
                serde_json::to_value(session.withdraw(&asset, amount).await?)?
            }
            Command::Order {
                pair,
                side,
                price,
                amount,
                base,
                no_native_tokens,
            } => {
                let size = if base {
                    OrderSize::Base(amount)
                } else {
                    OrderSize::Trade(amount)
                };
                serde_json::to_value(
                    session
                        .place_sized_order(&pair, side, price, size, !no_native_tokens)
                        .await?,
                )?
            }
            Command::Cancel { order_id } => {
                serde_json::to_value(session.cancel_order(&order_id).await?)?
            }
            Command::Trades {
                pair,
                from,
                to,
                limit,
            } => serde_json::to_value(session.get_trades(&pair, from, to, limit).await?)?,
            Command::Balances { address } => {
                serde_json::to_value(session.get_balances(address.as_deref()).await?)?
            }
        };

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use swth_registry::{HttpMethod, MockExchange};
    use swth_signer::KeySource;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(std::iter::once("swth").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_parse_order() {
        let command = parse(&["order", "SWTH_NEO", "buy", "0.0001", "1000", "--no-native-tokens"]);
        assert_eq!(
            command,
            Command::Order {
                pair: Pair::new("SWTH", "NEO"),
                side: Side::Buy,
                price: dec!(0.0001),
                amount: dec!(1000),
                base: false,
                no_native_tokens: true,
            }
        );
    }

    #[test]
    fn test_parse_trades_range() {
        let command = parse(&[
            "trades",
            "SWTH_NEO",
            "--from",
            "2018-08-08T00:00:00Z",
            "--limit",
            "10",
        ]);
        match command {
            Command::Trades { from, to, limit, .. } => {
                assert_eq!(from.map(|t| t.timestamp()), Some(1_533_686_400));
                assert_eq!(to, None);
                assert_eq!(limit, Some(10));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_amount() {
        let result = Cli::try_parse_from(["swth", "deposit", "NEO", "lots"]);
        assert!(result.is_err());
    }

    fn exchange() -> Arc<MockExchange> {
        let api = MockExchange::new();
        api.on_get(
            "/exchange/tokens",
            json!({"NEO": {"hash": "c56f33fc6ecfcd0c225c4ab356fee59390af8560be0e930faebe74a6daff7c9b", "decimals": 8}}),
        );
        api.on_get(
            "/exchange/contracts",
            json!({"NEO": {"V1": "0ec5712e0f7c63e4b0fea31029a28cea5e9d551f", "V2": "a195c1549e7da61b8da315765a790ac7e7633b82"}}),
        );
        api.on_get(
            "/exchange/timestamp",
            json!({"timestamp": Utc::now().timestamp_millis()}),
        );
        Arc::new(api)
    }

    const KEY: &str = "7d128a6d096f0c14c3a25a2b0c41cf79661bfcb4a8cc95aaaea28bde4d732344";

    /// Config whose key file holds `login`. The file must outlive `with_api`.
    fn config_with_login(login: &str) -> (AppConfig, tempfile::NamedTempFile) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{login}").unwrap();

        let mut config: AppConfig =
            toml::from_str(r#"key = { source = "file", path = "unused" }"#).unwrap();
        config.key = KeySource::File {
            path: file.path().to_path_buf(),
        };
        (config, file)
    }

    fn watch_only_config() -> (AppConfig, tempfile::NamedTempFile) {
        let address = Wallet::from_login(KEY).unwrap().address().to_string();
        config_with_login(&address)
    }

    #[tokio::test]
    async fn test_info_reports_resolved_contract() {
        let (config, _key_file) = watch_only_config();
        let app = Application::with_api(exchange(), &config)
            .await
            .unwrap();

        let info = app.execute(Command::Info).await.unwrap();
        assert_eq!(info["contract_version"], json!("V2"));
        assert_eq!(info["contract_hash"], json!("a195c1549e7da61b8da315765a790ac7e7633b82"));
        assert_eq!(info["can_sign"], json!(false));
    }

    #[tokio::test]
    async fn test_balances_for_watch_only_wallet() {
        let api = exchange();
        api.on_get(
            "/balances",
            json!({"confirming": {}, "confirmed": {"NEO": "1.5"}, "locked": {}}),
        );
        let (config, _key_file) = watch_only_config();
        let app = Application::with_api(api.clone(), &config)
            .await
            .unwrap();

        let balances = app
            .execute(Command::Balances { address: None })
            .await
            .unwrap();
        assert_eq!(balances["confirmed"]["NEO"], json!("1.5"));
        assert_eq!(api.call_count(), 4);
    }

    #[tokio::test]
    async fn test_signed_command_fails_for_watch_only_wallet() {
        let api = exchange();
        let (config, _key_file) = watch_only_config();
        let app = Application::with_api(api.clone(), &config)
            .await
            .unwrap();

        let result = app
            .execute(Command::Deposit {
                asset: "NEO".to_string(),
                amount: dec!(1),
            })
            .await;
        assert!(result.is_err());
        assert!(api.calls_to("/deposits").is_empty());
    }

    #[test]
    fn test_parse_base_sized_order() {
        let command = parse(&["order", "SWTH_NEO", "sell", "0.0001", "0.5", "--base"]);
        assert!(matches!(command, Command::Order { base: true, .. }));
    }

    #[tokio::test]
    async fn test_base_order_sends_unmultiplied_want_amount() {
        let api = exchange();
        api.reject(HttpMethod::Post, "/orders", 422, "insufficient balance");
        let (config, _key_file) = config_with_login(KEY);
        let app = Application::with_api(api.clone(), &config).await.unwrap();

        let result = app
            .execute(Command::Order {
                pair: Pair::new("SWTH", "NEO"),
                side: Side::Buy,
                price: dec!(0.0001),
                amount: dec!(0.5),
                base: true,
                no_native_tokens: false,
            })
            .await;
        assert!(result.is_err());

        let create = &api.calls_to("/orders")[0];
        let body = create.body.as_ref().unwrap();
        assert_eq!(body["want_amount"], json!("50000000"));
        assert_eq!(body["use_native_tokens"], json!(true));
    }
}
