//! Per-fill and per-make signing of a created order.
//!
//! An order is broadcast with one signature per fill and per make, each over
//! that entry's own serialized transaction. The maps are keyed by id, so
//! their ordering carries no meaning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use swth_core::{Order, TransactionDescriptor};
use swth_signer::{Signature, SignatureEngine, TransactionSerializer};
use tracing::debug;

use crate::error::{ActionError, ActionResult};

/// Signatures for every fill and make of one order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSignatures {
    pub fills: BTreeMap<String, Signature>,
    pub makes: BTreeMap<String, Signature>,
}

impl OrderSignatures {
    pub fn len(&self) -> usize {
        self.fills.len() + self.makes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty() && self.makes.is_empty()
    }

    /// Ids present on `order` that have no signature here.
    pub fn missing(&self, order: &Order) -> Vec<String> {
        let fills = order
            .fills
            .iter()
            .map(|f| &f.id)
            .filter(|id| !self.fills.contains_key(*id));
        let makes = order
            .makes
            .iter()
            .map(|m| &m.id)
            .filter(|id| !self.makes.contains_key(*id));
        fills.chain(makes).cloned().collect()
    }
}

/// Signs the embedded transactions of an order.
#[derive(Debug, Clone, Copy)]
pub struct OrderSigner<'a> {
    engine: &'a SignatureEngine,
}

impl<'a> OrderSigner<'a> {
    pub fn new(engine: &'a SignatureEngine) -> Self {
        Self { engine }
    }

    /// Sign every fill and make of `order`.
    ///
    /// # Errors
    /// - `Deserialization` if an entry has no transaction or it does not serialize
    /// - `Signing` on key failure
    pub fn sign(&self, order: &Order) -> ActionResult<OrderSignatures> {
        let mut signatures = OrderSignatures::default();

        for fill in &order.fills {
            let signature = self.sign_entry("fill", &fill.id, fill.txn.as_ref())?;
            signatures.fills.insert(fill.id.clone(), signature);
        }
        for make in &order.makes {
            let signature = self.sign_entry("make", &make.id, make.txn.as_ref())?;
            signatures.makes.insert(make.id.clone(), signature);
        }

        debug!(
            order_id = %order.id,
            fills = signatures.fills.len(),
            makes = signatures.makes.len(),
            "Order entries signed"
        );
        Ok(signatures)
    }

    fn sign_entry(
        &self,
        kind: &str,
        id: &str,
        txn: Option<&TransactionDescriptor>,
    ) -> ActionResult<Signature> {
        let txn = txn.ok_or_else(|| {
            ActionError::Deserialization(format!("{kind} {id} has no transaction to sign"))
        })?;
        let bytes = TransactionSerializer::serialize(txn)?;
        Ok(self.engine.sign(&bytes)?)
    }
}
