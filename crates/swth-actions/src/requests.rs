//! Request bodies for the signed endpoints.
//!
//! Each request type is exactly the message that gets framed and signed;
//! field order is declaration order. After signing, [`Signed`] adds the
//! `address` and `signature` without re-declaring the request's fields.

use rust_decimal::Decimal;
use serde::Serialize;
use swth_core::{Pair, Side};
use swth_signer::Signature;

/// Only limit orders are supported by the exchange.
pub const ORDER_TYPE_LIMIT: &str = "limit";

/// `POST /deposits` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositRequest {
    /// On-chain integer amount.
    pub amount: String,
    pub asset_id: String,
    pub blockchain: String,
    pub contract_hash: String,
    pub timestamp: u64,
}

/// `POST /withdrawals` message. Same shape as a deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalRequest {
    pub amount: String,
    pub asset_id: String,
    pub blockchain: String,
    pub contract_hash: String,
    pub timestamp: u64,
}

/// `POST /orders` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub blockchain: String,
    pub contract_hash: String,
    pub order_type: String,
    pub pair: Pair,
    /// Limit price, trailing zeros removed.
    pub price: String,
    pub side: Side,
    pub timestamp: u64,
    pub use_native_tokens: bool,
    /// On-chain integer amount in the pair's base asset.
    pub want_amount: String,
}

impl OrderRequest {
    /// Canonical price rendering (`0.00010000` → `0.0001`).
    pub fn format_price(price: Decimal) -> String {
        price.normalize().to_string()
    }
}

/// How an order is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSize {
    /// Amount of the traded token; the order wants `price × amount`.
    Trade(Decimal),
    /// Amount of the base asset, sent as the want amount unchanged.
    Base(Decimal),
}

impl OrderSize {
    pub fn amount(&self) -> Decimal {
        match self {
            Self::Trade(amount) | Self::Base(amount) => *amount,
        }
    }

    /// Want amount in human units of the pair's base asset.
    pub fn want_amount(&self, price: Decimal) -> Option<Decimal> {
        match self {
            Self::Trade(amount) => price.checked_mul(*amount),
            Self::Base(amount) => Some(*amount),
        }
    }
}

/// `POST /cancellations` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancellationRequest {
    pub order_id: String,
    pub timestamp: u64,
}

/// Message signed when broadcasting a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalConfirmation {
    pub id: String,
    pub timestamp: u64,
}

/// A request plus the proof that the wallet owner issued it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signed<T> {
    #[serde(flatten)]
    pub request: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub signature: Signature,
}

impl<T> Signed<T> {
    /// Signed request carrying the exchange address of the signer.
    pub fn new(request: T, address: impl Into<String>, signature: Signature) -> Self {
        Self {
            request,
            address: Some(address.into()),
            signature,
        }
    }

    /// Signed request without an address echo.
    pub fn anonymous(request: T, signature: Signature) -> Self {
        Self {
            request,
            address: None,
            signature,
        }
    }
}
