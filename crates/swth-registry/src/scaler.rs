//! Human ↔ on-chain amount conversion.
//!
//! On-chain amounts are integers in the token's smallest unit, rendered as
//! decimal-digit strings. Conversion to chain truncates toward zero.

use std::sync::Arc;

use rust_decimal::Decimal;
use swth_core::Pair;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::tokens::TokenCatalog;

/// Scales amounts with the decimals declared in the token catalog.
#[derive(Debug, Clone)]
pub struct AmountScaler {
    catalog: Arc<TokenCatalog>,
}

impl AmountScaler {
    pub fn new(catalog: Arc<TokenCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &TokenCatalog {
        &self.catalog
    }

    /// Scale `amount` to the smallest unit of `asset`.
    ///
    /// `asset` is either a token symbol (`SWTH`) or a pair (`SWTH_NEO`); for
    /// a pair the base leg's decimals apply, since order amounts are quoted
    /// in it.
    ///
    /// # Errors
    /// - `UnknownAsset` if the token is not in the catalog
    /// - `InvalidAmount` for negative amounts or on overflow
    pub fn to_on_chain(&self, asset: &str, amount: Decimal) -> RegistryResult<String> {
        let symbol = match asset.parse::<Pair>() {
            Ok(pair) => pair.base_symbol().to_string(),
            Err(_) => asset.to_string(),
        };
        let token = self.catalog.resolve(&symbol)?;

        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(RegistryError::InvalidAmount(format!(
                "negative amount {amount}"
            )));
        }

        let scaled = amount
            .checked_mul(pow10(token.decimals)?)
            .ok_or_else(|| {
                RegistryError::InvalidAmount(format!(
                    "{amount} {} overflows at {} decimals",
                    token.symbol, token.decimals
                ))
            })?;
        let truncated = scaled.trunc();

        if truncated != scaled {
            debug!(
                symbol = %token.symbol,
                %amount,
                dropped = %(scaled - truncated),
                "Sub-unit precision truncated"
            );
        }

        Ok(truncated.abs().to_string())
    }

    /// Convert an on-chain integer amount back using `symbol`'s decimals.
    pub fn from_on_chain_for(&self, symbol: &str, amount: &str) -> RegistryResult<Decimal> {
        let token = self.catalog.resolve(symbol)?;
        Self::from_on_chain(amount, token.decimals)
    }

    /// Convert an on-chain integer amount back to a human decimal.
    pub fn from_on_chain(amount: &str, decimals: u32) -> RegistryResult<Decimal> {
        let units: i128 = amount
            .trim()
            .parse()
            .map_err(|e| RegistryError::InvalidAmount(format!("{amount:?}: {e}")))?;

        Decimal::try_from_i128_with_scale(units, decimals)
            .map_err(|e| RegistryError::InvalidAmount(format!("{amount} at {decimals} decimals: {e}")))
    }
}

fn pow10(decimals: u32) -> RegistryResult<Decimal> {
    10i64
        .checked_pow(decimals)
        .map(Decimal::from)
        .ok_or_else(|| RegistryError::InvalidAmount(format!("unsupported decimals {decimals}")))
}
