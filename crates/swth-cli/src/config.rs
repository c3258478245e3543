//! Application configuration.

use std::time::Duration;

use serde::Deserialize;
use swth_actions::{SessionConfig, DEFAULT_SKEW_TOLERANCE_MS};
use swth_registry::{MAINNET_URL, TESTNET_URL};
use swth_signer::{KeySource, SigningScheme};
use swth_telemetry::LoggingConfig;

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Explicit API root. Overrides `test_region` when set.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Use the test region instead of production.
    #[serde(default)]
    pub test_region: bool,

    #[serde(default = "default_blockchain")]
    pub blockchain: String,

    /// Contract version name; empty selects the newest deployment.
    #[serde(default)]
    pub contract_version: String,

    #[serde(default)]
    pub signing_scheme: SigningScheme,

    /// Where the wallet login value is read from.
    pub key: KeySource,

    #[serde(default = "default_skew_tolerance")]
    pub clock_skew_tolerance_ms: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_blockchain() -> String {
    "neo".to_string()
}

fn default_skew_tolerance() -> u64 {
    DEFAULT_SKEW_TOLERANCE_MS
}

fn default_request_timeout() -> u64 {
    10
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail later at connect time.
    pub fn validate(&self) -> AppResult<()> {
        if self.blockchain.trim().is_empty() {
            return Err(AppError::Config("blockchain must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if let Some(url) = &self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::Config(format!("base_url is not an http(s) URL: {url}")));
            }
        }
        Ok(())
    }

    /// API root after applying `base_url` and `test_region`.
    pub fn api_url(&self) -> &str {
        match &self.base_url {
            Some(url) => url,
            None if self.test_region => TESTNET_URL,
            None => MAINNET_URL,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            blockchain: self.blockchain.clone(),
            contract_version: self.contract_version.clone(),
            signing_scheme: self.signing_scheme,
            clock_skew_tolerance_ms: self.clock_skew_tolerance_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
key = { source = "env_var", var_name = "SWTH_KEY" }
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str(MINIMAL).unwrap();

        assert_eq!(config.blockchain, "neo");
        assert_eq!(config.contract_version, "");
        assert_eq!(config.signing_scheme, SigningScheme::EllipticCurve);
        assert_eq!(config.clock_skew_tolerance_ms, DEFAULT_SKEW_TOLERANCE_MS);
        assert_eq!(config.api_url(), MAINNET_URL);
        assert_eq!(
            config.key,
            KeySource::EnvVar {
                var_name: "SWTH_KEY".to_string()
            }
        );
    }

    #[test]
    fn test_full_config() {
        let config: AppConfig = toml::from_str(
            r#"
test_region = true
blockchain = "neo"
contract_version = "V2"
signing_scheme = "keyed_hash"
clock_skew_tolerance_ms = 500
request_timeout_secs = 20
key = { source = "file", path = "/etc/swth/key" }

[logging]
filter = "warn"
format = "json"
"#,
        )
        .unwrap();

        assert_eq!(config.api_url(), TESTNET_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(20));

        let session = config.session_config();
        assert_eq!(session.contract_version, "V2");
        assert_eq!(session.signing_scheme, SigningScheme::KeyedHash);
        assert_eq!(session.clock_skew_tolerance_ms, 500);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_base_url_overrides_region() {
        let config: AppConfig = toml::from_str(&format!(
            "base_url = \"http://localhost:8080/v2\"\ntest_region = true\n{MINIMAL}"
        ))
        .unwrap();
        assert_eq!(config.api_url(), "http://localhost:8080/v2");
    }

    #[test]
    fn test_missing_key_is_parse_error() {
        assert!(toml::from_str::<AppConfig>("blockchain = \"neo\"").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config: AppConfig = toml::from_str(MINIMAL).unwrap();
        config.request_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config: AppConfig = toml::from_str(MINIMAL).unwrap();
        config.blockchain = " ".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config: AppConfig = toml::from_str(MINIMAL).unwrap();
        config.base_url = Some("ftp://example".to_string());
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "contract_version = \"V1\"{MINIMAL}").unwrap();

        let config = AppConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.contract_version, "V1");
    }

    #[test]
    fn test_from_missing_file() {
        let err = AppConfig::from_file("/nonexistent/swth.toml").unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("Failed to read")));
    }
}
