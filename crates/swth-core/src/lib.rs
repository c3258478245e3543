//! Core domain types for the signed-action exchange client.
//!
//! This crate provides the data model shared by every other crate:
//! - `Token`, `Pair`, `Side`: market identification
//! - `TransactionDescriptor`: exchange-prepared on-chain transaction
//! - `Order`, `Fill`, `Make`: order lifecycle entities returned by the exchange

pub mod error;
pub mod market;
pub mod order;
pub mod transaction;

pub use error::{CoreError, Result};
pub use market::{Pair, Side, Token};
pub use order::{Balances, Fill, Make, Order, TradeDetail, WithdrawalResult};
pub use transaction::{
    TransactionAttribute, TransactionDescriptor, TransactionInput, TransactionOutput,
    CONTRACT_TRANSACTION, INVOCATION_TRANSACTION,
};
