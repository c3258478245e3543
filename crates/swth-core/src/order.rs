//! Order, fill, and make entities returned by the exchange.
//!
//! Amount fields are on-chain integer strings exactly as the exchange
//! reports them; conversion back to human amounts is the amount scaler's job.

use crate::market::Side;
use crate::transaction::TransactionDescriptor;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Matched portion of an order. Settled by its own transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub id: String,
    #[serde(default)]
    pub offer_hash: Option<String>,
    #[serde(default)]
    pub offer_asset_id: Option<String>,
    #[serde(default)]
    pub want_asset_id: Option<String>,
    #[serde(default)]
    pub fill_amount: Option<String>,
    #[serde(default)]
    pub want_amount: Option<String>,
    #[serde(default)]
    pub filled_amount: Option<String>,
    #[serde(default)]
    pub fee_asset_id: Option<String>,
    #[serde(default)]
    pub fee_amount: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Transaction to sign. Absent once the fill has been broadcast.
    #[serde(default)]
    pub txn: Option<TransactionDescriptor>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

/// Unmatched (resting) portion of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Make {
    pub id: String,
    #[serde(default)]
    pub offer_hash: Option<String>,
    #[serde(default)]
    pub available_amount: Option<String>,
    #[serde(default)]
    pub offer_asset_id: Option<String>,
    #[serde(default)]
    pub offer_amount: Option<String>,
    #[serde(default)]
    pub want_asset_id: Option<String>,
    #[serde(default)]
    pub want_amount: Option<String>,
    #[serde(default)]
    pub filled_amount: Option<String>,
    /// Transaction to sign. Absent once the make has been broadcast.
    #[serde(default)]
    pub txn: Option<TransactionDescriptor>,
    #[serde(default)]
    pub cancel_txn: Option<TransactionDescriptor>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

/// Order as created or broadcast by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub blockchain: Option<String>,
    #[serde(default)]
    pub contract_hash: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub pair: Option<String>,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub offer_asset_id: Option<String>,
    #[serde(default)]
    pub want_asset_id: Option<String>,
    #[serde(default)]
    pub offer_amount: Option<String>,
    #[serde(default)]
    pub want_amount: Option<String>,
    #[serde(default)]
    pub transfer_amount: Option<String>,
    #[serde(default)]
    pub priority_gas_amount: Option<String>,
    #[serde(default)]
    pub use_native_token: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Settlement status (`pending`, `processed`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Book status (`open`, `cancelled`, `completed`).
    #[serde(default)]
    pub order_status: Option<String>,
    #[serde(default)]
    pub fills: Vec<Fill>,
    #[serde(default)]
    pub makes: Vec<Make>,
}

impl Order {
    /// Whether the order is still resting on the book.
    pub fn is_open(&self) -> bool {
        self.order_status.as_deref() == Some("open")
    }

    /// Whether the order has completed (fully filled or settled).
    pub fn is_completed(&self) -> bool {
        self.order_status.as_deref() == Some("completed")
    }
}

/// Public trade history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDetail {
    pub id: String,
    #[serde(default)]
    pub fill_amount: Option<Decimal>,
    #[serde(default)]
    pub take_amount: Option<Decimal>,
    #[serde(default)]
    pub event_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_buy: Option<bool>,
}

/// Result of a withdrawal broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalResult {
    pub id: String,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub blockchain: Option<String>,
    #[serde(default)]
    pub reason_code: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub contract_hash: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Contract balances for one address, keyed by asset symbol.
///
/// Amounts are on-chain integers; `confirming` lists in-flight deposits and
/// withdrawals as returned by the exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    #[serde(default)]
    pub confirming: HashMap<String, Vec<serde_json::Value>>,
    #[serde(default)]
    pub confirmed: HashMap<String, Decimal>,
    #[serde(default)]
    pub locked: HashMap<String, Decimal>,
}

impl Balances {
    /// Confirmed on-chain amount for `symbol`, zero when absent.
    pub fn confirmed(&self, symbol: &str) -> Decimal {
        self.confirmed.get(symbol).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_deserializes_with_fills_and_makes() {
        let json = r#"{
            "id": "c415f943-bea8-4dbf-82e3-8460c559d8b7",
            "blockchain": "neo",
            "contract_hash": "a195c1549e7da61b8da315765a790ac7e7633b82",
            "address": "6d9e8ef1f35c9e0b1e7e4e3b8a3d55f61d0d1c2b",
            "side": "buy",
            "offer_asset_id": "c56f33fc6ecfcd0c225c4ab356fee59390af8560be0e930faebe74a6daff7c9b",
            "want_asset_id": "ab38352559b8b203bde5fddfa0b07d8b2525e132",
            "offer_amount": "10000000",
            "want_amount": "100000000000",
            "use_native_token": true,
            "created_at": "2018-08-08T10:14:17.257Z",
            "status": "pending",
            "order_status": "open",
            "fills": [{"id": "f1", "price": "0.0001", "txn": {"type": 209, "version": 1}}],
            "makes": [{"id": "m1", "txn": null}]
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.side, Some(Side::Buy));
        assert!(order.is_open());
        assert!(!order.is_completed());
        assert_eq!(order.fills.len(), 1);
        assert!(order.fills[0].txn.is_some());
        assert!(order.makes[0].txn.is_none());
    }

    #[test]
    fn test_order_minimal_shape() {
        let order: Order = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert!(order.fills.is_empty());
        assert!(order.makes.is_empty());
        assert!(order.status.is_none());
    }

    #[test]
    fn test_balances_accept_string_amounts() {
        let json = r#"{"confirming": {}, "confirmed": {"NEO": "100000000"}, "locked": {"NEO": 0}}"#;
        let balances: Balances = serde_json::from_str(json).unwrap();
        assert_eq!(balances.confirmed("NEO"), Decimal::from(100_000_000));
        assert!(balances.confirmed("GAS").is_zero());
    }
}
