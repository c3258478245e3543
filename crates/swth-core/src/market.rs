//! Market identification types.
//!
//! Pairs are written `ASSET_BASE` (e.g. `SWTH_NEO`): the first leg is the
//! traded asset, the second the asset prices and amounts are quoted in.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Asset metadata loaded from the exchange token list.
///
/// Immutable once loaded. `asset_id` is the on-chain identifier (a 256-bit
/// asset hash for native assets, a 160-bit script hash for NEP-5 tokens),
/// in big-endian display hex without `0x`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub asset_id: String,
    pub decimals: u32,
}

impl Token {
    pub fn new(symbol: impl Into<String>, asset_id: impl Into<String>, decimals: u32) -> Self {
        Self {
            symbol: symbol.into(),
            asset_id: asset_id.into(),
            decimals,
        }
    }
}

/// Trading pair, e.g. `SWTH_NEO`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pair {
    trade: String,
    base: String,
}

impl Pair {
    pub fn new(trade: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            trade: trade.into().to_uppercase(),
            base: base.into().to_uppercase(),
        }
    }

    /// Traded asset symbol (left leg).
    pub fn trade_symbol(&self) -> &str {
        &self.trade
    }

    /// Base asset symbol (right leg). Order amounts are denominated in it.
    pub fn base_symbol(&self) -> &str {
        &self.base
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.trade, self.base)
    }
}

impl FromStr for Pair {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('_') {
            Some((trade, base))
                if !trade.is_empty() && !base.is_empty() && !base.contains('_') =>
            {
                Ok(Self::new(trade, base))
            }
            _ => Err(CoreError::InvalidPair(s.to_string())),
        }
    }
}

impl TryFrom<String> for Pair {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Pair> for String {
    fn from(pair: Pair) -> Self {
        pair.to_string()
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for Side {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            _ => Err(CoreError::InvalidSide(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_parse() {
        let pair: Pair = "swth_neo".parse().unwrap();
        assert_eq!(pair.trade_symbol(), "SWTH");
        assert_eq!(pair.base_symbol(), "NEO");
        assert_eq!(pair.to_string(), "SWTH_NEO");
    }

    #[test]
    fn test_pair_parse_rejects_malformed() {
        assert!("SWTHNEO".parse::<Pair>().is_err());
        assert!("_NEO".parse::<Pair>().is_err());
        assert!("SWTH_".parse::<Pair>().is_err());
        assert!("A_B_C".parse::<Pair>().is_err());
    }

    #[test]
    fn test_pair_serde_as_string() {
        let pair = Pair::new("SWTH", "NEO");
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, r#""SWTH_NEO""#);
        let back: Pair = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pair);
    }

    #[test]
    fn test_side_parse_and_display() {
        assert_eq!("BUY".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!(Side::Sell.to_string(), "sell");
        assert!("hold".parse::<Side>().is_err());
    }
}
