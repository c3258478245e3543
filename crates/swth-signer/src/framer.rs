//! Structured-message framing.
//!
//! Wire format (what the exchange re-frames and verifies):
//!
//! ```text
//! 01 00 01 f0 | len (1 byte) | payload (len bytes) | 00 00
//! ```
//!
//! `payload` is the compact JSON of the message with fields in declaration
//! order.
//!
//! The legacy keyed-hash generation signs a text rendering of the same frame
//! instead: `010001f0`, the payload length in decimal (at least two digits),
//! the payload as upper-case hex, then `0000`. serde_json must be built with `preserve_order` so that payloads
//! passed as `serde_json::Value` keep their insertion order too.

use serde::Serialize;

use crate::error::{SignerError, SignerResult};

/// Fixed 4-byte magic prefix.
pub const MESSAGE_PREFIX: [u8; 4] = [0x01, 0x00, 0x01, 0xf0];
/// Fixed 2-byte suffix.
pub const MESSAGE_SUFFIX: [u8; 2] = [0x00, 0x00];
/// The length prefix is a single byte.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

const LEGACY_PREFIX: &str = "010001f0";
const LEGACY_SUFFIX: &str = "0000";

/// Deterministic framer for signable payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageFramer;

impl MessageFramer {
    /// Serialize `payload` to compact JSON and frame it.
    ///
    /// # Errors
    /// - `SerializationFailed` if the payload cannot be serialized
    /// - `PayloadTooLarge` if the JSON exceeds 255 bytes
    pub fn frame<T: Serialize + ?Sized>(payload: &T) -> SignerResult<Vec<u8>> {
        let json = serde_json::to_vec(payload)
            .map_err(|e| SignerError::SerializationFailed(e.to_string()))?;
        Self::frame_bytes(&json)
    }

    /// Frame an already-serialized payload.
    pub fn frame_bytes(payload: &[u8]) -> SignerResult<Vec<u8>> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(SignerError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }

        let mut out =
            Vec::with_capacity(MESSAGE_PREFIX.len() + 1 + payload.len() + MESSAGE_SUFFIX.len());
        out.extend_from_slice(&MESSAGE_PREFIX);
        out.push(payload.len() as u8);
        out.extend_from_slice(payload);
        out.extend_from_slice(&MESSAGE_SUFFIX);
        Ok(out)
    }

    /// Payload carried by `framed`, or `None` if the bytes are not a frame.
    pub fn payload(framed: &[u8]) -> Option<&[u8]> {
        let body = framed
            .strip_prefix(&MESSAGE_PREFIX[..])?
            .strip_suffix(&MESSAGE_SUFFIX[..])?;
        let (len, payload) = body.split_first()?;
        (usize::from(*len) == payload.len()).then_some(payload)
    }

    /// Legacy text rendering of a framed payload.
    pub fn legacy_message(payload: &[u8]) -> String {
        format!(
            "{LEGACY_PREFIX}{:02}{}{LEGACY_SUFFIX}",
            payload.len(),
            hex::encode_upper(payload)
        )
    }
}
