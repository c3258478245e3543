//! HTTP transport to the exchange REST API.
//!
//! The `ExchangeApi` trait keeps signing and orchestration independent of
//! the transport, allowing for:
//! - Unit testing with the recording `MockExchange`
//! - A reqwest-backed `RestClient` in production

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{RegistryError, RegistryResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Production API root.
pub const MAINNET_URL: &str = "https://api.switcheo.network/v2";
/// Test-region API root.
pub const TESTNET_URL: &str = "https://test-api.switcheo.network/v2";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-level access to the exchange.
///
/// Paths are relative to the API root (e.g. `/exchange/tokens`). Any
/// non-2xx answer surfaces as `RegistryError::Http`; transport failures as
/// `RegistryError::Network`; unparseable bodies as `Deserialization`.
pub trait ExchangeApi: Send + Sync {
    /// `GET path?query`.
    fn get<'a>(
        &'a self,
        path: &'a str,
        query: &'a [(String, String)],
    ) -> BoxFuture<'a, RegistryResult<Value>>;

    /// `POST path` with a JSON body.
    fn post<'a>(&'a self, path: &'a str, body: Value) -> BoxFuture<'a, RegistryResult<Value>>;
}

/// reqwest-backed exchange client.
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - API root (e.g. [`MAINNET_URL`])
    pub fn new(base_url: impl Into<String>) -> RegistryResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new client with an explicit request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> RegistryResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Client for the production or test region.
    pub fn for_region(test_region: bool) -> RegistryResult<Self> {
        Self::new(if test_region { TESTNET_URL } else { MAINNET_URL })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json(response: reqwest::Response) -> RegistryResult<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "Exchange returned error status");
            return Err(RegistryError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| RegistryError::Deserialization(format!("Failed to parse response: {e}")))
    }
}

impl ExchangeApi for RestClient {
    fn get<'a>(
        &'a self,
        path: &'a str,
        query: &'a [(String, String)],
    ) -> BoxFuture<'a, RegistryResult<Value>> {
        Box::pin(async move {
            let url = self.url(path);
            debug!(%url, params = query.len(), "GET");

            let response = self
                .client
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(|e| RegistryError::Network(format!("GET {path} failed: {e}")))?;

            Self::read_json(response).await
        })
    }

    fn post<'a>(&'a self, path: &'a str, body: Value) -> BoxFuture<'a, RegistryResult<Value>> {
        Box::pin(async move {
            let url = self.url(path);
            debug!(%url, "POST");

            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| RegistryError::Network(format!("POST {path} failed: {e}")))?;

            Self::read_json(response).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_urls() {
        assert_eq!(RestClient::for_region(false).unwrap().base_url(), MAINNET_URL);
        assert_eq!(RestClient::for_region(true).unwrap().base_url(), TESTNET_URL);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RestClient::new("http://localhost:8080/v2/").unwrap();
        assert_eq!(client.url("/exchange/tokens"), "http://localhost:8080/v2/exchange/tokens");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client =
            RestClient::with_timeout("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let result = client.get("/exchange/timestamp", &[]).await;
        assert!(matches!(result, Err(RegistryError::Network(_))));
    }
}
