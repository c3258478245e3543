//! Native transaction serialization (unsigned form).
//!
//! Layout, in order:
//! 1. `type` (u8), `version` (u8)
//! 2. exclusive data: invocation transactions carry `varbytes(script)` and,
//!    from version 1, the gas fee as fixed8. Contract transactions carry none.
//! 3. `varint(n)` attributes: usage byte, a length prefix for variable-size
//!    usages, then the data
//! 4. `varint(n)` inputs: prev hash (32B, reversed), prev index (u16 LE)
//! 5. `varint(n)` outputs: asset id (32B, reversed), value (fixed8 i64 LE),
//!    script hash (20B, reversed)
//!
//! Hash fields arrive big-endian and go on the wire little-endian. Getting
//! any of this wrong still yields a "successful" HTTP broadcast but a
//! signature the chain rejects.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use swth_core::{TransactionAttribute, TransactionDescriptor, TransactionInput, TransactionOutput};

use crate::error::{SignerError, SignerResult};

/// Fixed8 scaling factor (10^8).
const FIXED8_FACTOR: i64 = 100_000_000;

mod usage {
    pub const CONTRACT_HASH: u8 = 0x00;
    pub const ECDH02: u8 = 0x02;
    pub const ECDH03: u8 = 0x03;
    pub const SCRIPT: u8 = 0x20;
    pub const VOTE: u8 = 0x30;
    pub const DESCRIPTION_URL: u8 = 0x81;
    pub const DESCRIPTION: u8 = 0x90;
    pub const HASH1: u8 = 0xa1;
    pub const HASH15: u8 = 0xaf;
    pub const REMARK: u8 = 0xf0;
}

/// Serializer for exchange-prepared transactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionSerializer;

impl TransactionSerializer {
    /// Serialize a descriptor into the unsigned wire layout.
    ///
    /// # Errors
    /// Returns `InvalidTransaction` for malformed hex, wrong hash widths, or
    /// values that are not representable as fixed8.
    pub fn serialize(txn: &TransactionDescriptor) -> SignerResult<Vec<u8>> {
        let mut out = Vec::with_capacity(256);

        out.push(txn.tx_type);
        out.push(txn.version);

        if txn.is_invocation() {
            let script = decode_hex("script", &txn.script)?;
            write_var_bytes(&mut out, &script);
            if txn.version >= 1 {
                out.extend_from_slice(&to_fixed8(txn.gas)?.to_le_bytes());
            }
        }

        write_var_int(&mut out, txn.attributes.len() as u64);
        for attr in &txn.attributes {
            write_attribute(&mut out, attr)?;
        }

        write_var_int(&mut out, txn.inputs.len() as u64);
        for input in &txn.inputs {
            write_input(&mut out, input)?;
        }

        write_var_int(&mut out, txn.outputs.len() as u64);
        for output in &txn.outputs {
            write_output(&mut out, output)?;
        }

        Ok(out)
    }
}

fn write_attribute(out: &mut Vec<u8>, attr: &TransactionAttribute) -> SignerResult<()> {
    let data = decode_hex("attribute data", &attr.data)?;
    out.push(attr.usage);

    match attr.usage {
        usage::CONTRACT_HASH | usage::VOTE | usage::HASH1..=usage::HASH15 => {
            expect_len("attribute hash", &data, 32)?;
            out.extend_from_slice(&data);
        }
        usage::SCRIPT => {
            expect_len("attribute script hash", &data, 20)?;
            out.extend_from_slice(&data);
        }
        usage::ECDH02 | usage::ECDH03 => {
            // The usage byte carries the parity, so only the X coordinate goes on
            // the wire. A compressed key must have a prefix matching the usage.
            match data.len() {
                32 => out.extend_from_slice(&data),
                33 if data[0] == attr.usage => out.extend_from_slice(&data[1..]),
                len => {
                    return Err(SignerError::InvalidTransaction(format!(
                        "attribute ECDH key: expected 32 bytes or 33 with prefix 0x{:02x}, got {len}",
                        attr.usage
                    )))
                }
            }
        }
        usage::DESCRIPTION_URL => {
            let len = u8::try_from(data.len()).map_err(|_| {
                SignerError::InvalidTransaction("description url longer than 255 bytes".into())
            })?;
            out.push(len);
            out.extend_from_slice(&data);
        }
        u if u == usage::DESCRIPTION || u >= usage::REMARK => {
            write_var_bytes(out, &data);
        }
        other => {
            return Err(SignerError::InvalidTransaction(format!(
                "unknown attribute usage 0x{other:02x}"
            )));
        }
    }
    Ok(())
}

fn write_input(out: &mut Vec<u8>, input: &TransactionInput) -> SignerResult<()> {
    let hash = decode_reversed("prev hash", &input.prev_hash, 32)?;
    out.extend_from_slice(&hash);
    out.extend_from_slice(&input.prev_index.to_le_bytes());
    Ok(())
}

fn write_output(out: &mut Vec<u8>, output: &TransactionOutput) -> SignerResult<()> {
    let asset_id = decode_reversed("asset id", &output.asset_id, 32)?;
    let script_hash = decode_reversed("script hash", &output.script_hash, 20)?;

    out.extend_from_slice(&asset_id);
    out.extend_from_slice(&to_fixed8(output.value)?.to_le_bytes());
    out.extend_from_slice(&script_hash);
    Ok(())
}

/// Variable-length integer (NEO/Bitcoin style).
fn write_var_int(out: &mut Vec<u8>, value: u64) {
    if value < 0xfd {
        out.push(value as u8);
    } else if value <= 0xffff {
        out.push(0xfd);
        out.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        out.push(0xfe);
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.push(0xff);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

fn write_var_bytes(out: &mut Vec<u8>, data: &[u8]) {
    write_var_int(out, data.len() as u64);
    out.extend_from_slice(data);
}

/// Scale a human amount to fixed8. Sub-fixed8 precision is an error.
fn to_fixed8(value: Decimal) -> SignerResult<i64> {
    let scaled = value * Decimal::from(FIXED8_FACTOR);
    if !scaled.fract().is_zero() {
        return Err(SignerError::InvalidTransaction(format!(
            "value {value} has more than 8 decimal places"
        )));
    }
    scaled
        .to_i64()
        .ok_or_else(|| SignerError::InvalidTransaction(format!("value {value} overflows fixed8")))
}

fn decode_hex(field: &str, value: &str) -> SignerResult<Vec<u8>> {
    hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| SignerError::InvalidTransaction(format!("{field}: {e}")))
}

fn decode_reversed(field: &str, value: &str, len: usize) -> SignerResult<Vec<u8>> {
    let mut bytes = decode_hex(field, value)?;
    expect_len(field, &bytes, len)?;
    bytes.reverse();
    Ok(bytes)
}

fn expect_len(field: &str, data: &[u8], len: usize) -> SignerResult<()> {
    if data.len() != len {
        return Err(SignerError::InvalidTransaction(format!(
            "{field}: expected {len} bytes, got {}",
            data.len()
        )));
    }
    Ok(())
}
