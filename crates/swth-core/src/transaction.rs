//! Exchange-prepared on-chain transaction descriptors.
//!
//! The exchange returns these for deposits, cancellations, and every fill
//! and make of an order. They are consumed only by the transaction
//! serializer, which turns them into the byte layout the chain verifies.
//! Hash fields arrive as big-endian display hex; reversal to wire order
//! happens at serialization time, not here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `ContractTransaction` type byte (plain asset transfer).
pub const CONTRACT_TRANSACTION: u8 = 0x80;
/// `InvocationTransaction` type byte (carries a script and a gas fee).
pub const INVOCATION_TRANSACTION: u8 = 0xd1;

/// Transaction attribute: usage tag plus hex-encoded data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAttribute {
    pub usage: u8,
    pub data: String,
}

/// Reference to a previous transaction output being spent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub prev_hash: String,
    pub prev_index: u16,
}

/// Asset transfer to a script hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutput {
    pub asset_id: String,
    pub script_hash: String,
    /// Human amount; encoded as fixed8 on the wire.
    pub value: Decimal,
}

/// Transaction descriptor as returned by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDescriptor {
    #[serde(rename = "type")]
    pub tx_type: u8,
    pub version: u8,
    #[serde(default)]
    pub attributes: Vec<TransactionAttribute>,
    #[serde(default)]
    pub inputs: Vec<TransactionInput>,
    #[serde(default)]
    pub outputs: Vec<TransactionOutput>,
    /// Witness scripts; always empty on unsigned descriptors.
    #[serde(default)]
    pub scripts: Vec<serde_json::Value>,
    /// Invocation script, hex. Empty for contract transactions.
    #[serde(default)]
    pub script: String,
    /// Network fee in GAS.
    #[serde(default)]
    pub gas: Decimal,
    /// Exchange-computed transaction hash, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl TransactionDescriptor {
    /// Whether this is an invocation transaction (script + gas exclusive data).
    pub fn is_invocation(&self) -> bool {
        self.tx_type == INVOCATION_TRANSACTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_descriptor_deserializes_exchange_shape() {
        let json = r#"{
            "hash": "72b74c96b9174e9b9e1b216f7e8f21a6475e6541876a62614df7c1998c6e8376",
            "sha256": "2109cbb5eea67a06f5dd8663e10fcd1128e28df5721a25d993e05fe2097c34f3",
            "type": 209,
            "version": 1,
            "attributes": [{"usage": 32, "data": "592c8a46a0d06c600f06c994d1f25e7283b8a2fe"}],
            "inputs": [{"prevHash": "f09b3b697c580d1730cd360da5e1f0beeae00827eb2f0055cbc85a5a4dadd8ea", "prevIndex": 0}],
            "outputs": [{"assetId": "602c79718b16e442de58778e148d0b1084e3b2dffd5de6b7b16cee7969282de7", "scriptHash": "e707714512577b42f9a011f8b870625429f93573", "value": 1e-08}],
            "scripts": [],
            "script": "0800e1f505000000001432e125258b7db0a0dffde5bd03b2b859253538ab14592c8a46a0d06c600f06c994d1f25e7283b8a2fe53c1076465706f73697467823b63e7c70a795a7615a38d1ba67d9e54c195a1",
            "gas": 0
        }"#;

        let txn: TransactionDescriptor = serde_json::from_str(json).unwrap();
        assert!(txn.is_invocation());
        assert_eq!(txn.version, 1);
        assert_eq!(txn.attributes[0].usage, 0x20);
        assert_eq!(txn.inputs[0].prev_index, 0);
        assert_eq!(txn.outputs[0].value, dec!(0.00000001));
        assert_eq!(txn.gas, Decimal::ZERO);
    }

    #[test]
    fn test_descriptor_defaults_missing_collections() {
        let json = r#"{"type": 128, "version": 0}"#;
        let txn: TransactionDescriptor = serde_json::from_str(json).unwrap();
        assert!(!txn.is_invocation());
        assert!(txn.attributes.is_empty());
        assert!(txn.script.is_empty());
    }
}
