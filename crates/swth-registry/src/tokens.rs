//! Token catalog.
//!
//! Single source of truth for symbol → asset metadata. Loaded once from
//! `GET /exchange/tokens` and read-only afterward.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use swth_core::Token;
use tracing::{debug, info};

use crate::client::ExchangeApi;
use crate::error::{RegistryError, RegistryResult};

const TOKENS_PATH: &str = "/exchange/tokens";

/// One entry of the token list response.
#[derive(Debug, Deserialize)]
struct TokenEntry {
    #[serde(alias = "asset_id", alias = "assetId")]
    hash: String,
    decimals: u32,
}

/// Symbol-keyed token metadata.
#[derive(Debug, Clone, Default)]
pub struct TokenCatalog {
    by_symbol: HashMap<String, Token>,
    /// Lower-case asset id (no `0x`) → symbol.
    by_asset: HashMap<String, String>,
}

impl TokenCatalog {
    /// Fetch and index the exchange token list.
    pub async fn load(api: &dyn ExchangeApi) -> RegistryResult<Self> {
        let value = api.get(TOKENS_PATH, &[]).await?;
        let catalog = Self::from_value(value)?;
        info!(tokens = catalog.len(), "Token catalog loaded");
        Ok(catalog)
    }

    /// Parse a `{symbol: {hash, decimals}}` document.
    pub fn from_value(value: Value) -> RegistryResult<Self> {
        let entries: HashMap<String, TokenEntry> = serde_json::from_value(value)
            .map_err(|e| RegistryError::Deserialization(format!("token list: {e}")))?;

        Ok(Self::from_tokens(entries.into_iter().map(|(symbol, entry)| {
            Token::new(symbol, entry.hash.trim_start_matches("0x"), entry.decimals)
        })))
    }

    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Self {
        let mut catalog = Self::default();
        for mut token in tokens {
            token.symbol = token.symbol.to_uppercase();
            catalog
                .by_asset
                .insert(normalize_asset_id(&token.asset_id), token.symbol.clone());
            catalog.by_symbol.insert(token.symbol.clone(), token);
        }
        catalog
    }

    /// Look up a token by symbol (case-insensitive).
    ///
    /// # Errors
    /// `UnknownAsset` when the symbol is not listed.
    pub fn resolve(&self, symbol: &str) -> RegistryResult<&Token> {
        self.by_symbol
            .get(&symbol.to_uppercase())
            .ok_or_else(|| RegistryError::UnknownAsset(symbol.to_string()))
    }

    /// Reverse lookup: the symbol that owns `asset_id`.
    pub fn symbol_for_asset(&self, asset_id: &str) -> RegistryResult<&str> {
        let symbol = self
            .by_asset
            .get(&normalize_asset_id(asset_id))
            .map(String::as_str);
        debug!(asset_id, ?symbol, "Reverse asset lookup");
        symbol.ok_or_else(|| RegistryError::UnknownAsset(asset_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.by_symbol.values()
    }
}

fn normalize_asset_id(asset_id: &str) -> String {
    asset_id.trim_start_matches("0x").to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockExchange;
    use serde_json::json;

    const NEO_HASH: &str = "c56f33fc6ecfcd0c225c4ab356fee59390af8560be0e930faebe74a6daff7c9b";
    const SWTH_HASH: &str = "ab38352559b8b203bde5fddfa0b07d8b2525e132";

    fn tokens_json() -> Value {
        json!({
            "NEO": {"hash": NEO_HASH, "decimals": 0},
            "SWTH": {"hash": format!("0x{SWTH_HASH}"), "decimals": 8},
        })
    }

    #[test]
    fn test_resolve_symbol() {
        let catalog = TokenCatalog::from_value(tokens_json()).unwrap();

        let swth = catalog.resolve("swth").unwrap();
        assert_eq!(swth.asset_id, SWTH_HASH);
        assert_eq!(swth.decimals, 8);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_unknown_symbol() {
        let catalog = TokenCatalog::from_value(tokens_json()).unwrap();
        assert!(matches!(
            catalog.resolve("DOGE"),
            Err(RegistryError::UnknownAsset(s)) if s == "DOGE"
        ));
    }

    #[test]
    fn test_reverse_lookup_ignores_prefix_and_case() {
        let catalog = TokenCatalog::from_value(tokens_json()).unwrap();
        assert_eq!(
            catalog.symbol_for_asset(&format!("0x{}", NEO_HASH.to_uppercase())).unwrap(),
            "NEO"
        );
        assert!(catalog.symbol_for_asset("00").is_err());
    }

    #[test]
    fn test_asset_id_alias() {
        let catalog =
            TokenCatalog::from_value(json!({"GAS": {"assetId": "aa", "decimals": 8}})).unwrap();
        assert_eq!(catalog.resolve("GAS").unwrap().asset_id, "aa");
    }

    #[test]
    fn test_bad_shape_is_deserialization_error() {
        assert!(matches!(
            TokenCatalog::from_value(json!(["NEO"])),
            Err(RegistryError::Deserialization(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_exchange() {
        let mock = MockExchange::new();
        mock.on_get(TOKENS_PATH, tokens_json());

        let catalog = TokenCatalog::load(&mock).await.unwrap();
        assert_eq!(catalog.resolve("NEO").unwrap().decimals, 0);
        assert_eq!(mock.calls_to(TOKENS_PATH).len(), 1);
    }
}
