//! Signature engine.
//!
//! Two strategies share one `sign(bytes) -> Signature` contract. The strategy
//! is chosen once at construction (it follows the exchange API generation)
//! and never switches at runtime:
//!
//! - [`EllipticCurveSigner`]: ECDSA over P-256 of `SHA-256(bytes)`, encoded as
//!   `r ‖ s` (32 bytes each, big-endian), lower-case hex. Nonces are derived
//!   deterministically (RFC 6979), so the same key and bytes always give the
//!   same signature.
//! - [`KeyedHashSigner`]: HMAC-SHA256 keyed with the shared secret over the
//!   ASCII text the legacy generation verifies, lower-case hex. Framed
//!   messages are rendered with [`MessageFramer::legacy_message`]; any other
//!   pre-image as its upper-case hex text.

use std::fmt;

use hmac::{Hmac, Mac};
use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature as EcdsaSignature, SigningKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::trace;
use zeroize::Zeroizing;

use crate::error::{SignerError, SignerResult};
use crate::framer::MessageFramer;
use crate::wallet::Wallet;

type HmacSha256 = Hmac<Sha256>;

/// Width of each ECDSA scalar in the encoded signature.
const COMPONENT_LEN: usize = 32;

// =============================================================================
// Signature
// =============================================================================

/// Lower-case hex signature, consumed by exactly one broadcast call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Strategies
// =============================================================================

/// Signing scheme selector (configuration value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningScheme {
    /// Current API generation: ECDSA P-256.
    #[default]
    EllipticCurve,
    /// Legacy API generation: HMAC-SHA256.
    KeyedHash,
}

/// ECDSA P-256 signer.
#[derive(Clone)]
pub struct EllipticCurveSigner {
    signing_key: SigningKey,
}

impl EllipticCurveSigner {
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Build from a wallet. Fails on watch-only wallets.
    pub fn from_wallet(wallet: &Wallet) -> SignerResult<Self> {
        Ok(Self::new(wallet.signing_key()?.clone()))
    }

    /// Sign `SHA-256(bytes)` and return the 64-byte `r ‖ s` hex encoding.
    pub fn sign(&self, bytes: &[u8]) -> SignerResult<Signature> {
        let digest = Sha256::digest(bytes);
        let signature: EcdsaSignature = self
            .signing_key
            .sign_prehash(&digest)
            .map_err(|e| SignerError::SigningFailed(e.to_string()))?;

        let raw = signature.to_bytes();
        let (r, s) = raw.split_at(raw.len() / 2);

        let mut encoded = [0u8; COMPONENT_LEN * 2];
        encoded[..COMPONENT_LEN].copy_from_slice(&fit_component(r));
        encoded[COMPONENT_LEN..].copy_from_slice(&fit_component(s));

        Ok(Signature(hex::encode(encoded)))
    }
}

impl fmt::Debug for EllipticCurveSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EllipticCurveSigner").finish_non_exhaustive()
    }
}

/// Left-pad a big-endian scalar to 32 bytes, or keep its low 32 bytes.
fn fit_component(component: &[u8]) -> [u8; COMPONENT_LEN] {
    let mut out = [0u8; COMPONENT_LEN];
    if component.len() <= COMPONENT_LEN {
        out[COMPONENT_LEN - component.len()..].copy_from_slice(component);
    } else {
        out.copy_from_slice(&component[component.len() - COMPONENT_LEN..]);
    }
    out
}

/// HMAC-SHA256 signer for the legacy API generation.
#[derive(Clone)]
pub struct KeyedHashSigner {
    secret: Zeroizing<String>,
}

impl KeyedHashSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Key the HMAC with the wallet's private key as lower-case hex.
    pub fn from_wallet(wallet: &Wallet) -> SignerResult<Self> {
        Ok(Self::new(hex::encode(wallet.private_key()?)))
    }

    /// Sign a pre-image in its legacy text form.
    pub fn sign(&self, bytes: &[u8]) -> SignerResult<Signature> {
        match MessageFramer::payload(bytes) {
            Some(payload) => self.sign_message(&MessageFramer::legacy_message(payload)),
            None => self.sign_message(&hex::encode_upper(bytes)),
        }
    }

    /// HMAC-SHA256 over the UTF-8 encoding of `message`.
    pub fn sign_message(&self, message: &str) -> SignerResult<Signature> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| SignerError::SigningFailed(e.to_string()))?;
        mac.update(message.as_bytes());
        Ok(Signature(hex::encode(mac.finalize().into_bytes())))
    }
}

impl fmt::Debug for KeyedHashSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedHashSigner").finish_non_exhaustive()
    }
}

// =============================================================================
// SignatureEngine
// =============================================================================

/// Signing strategy fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub enum SignatureEngine {
    EllipticCurve(EllipticCurveSigner),
    KeyedHash(KeyedHashSigner),
}

impl SignatureEngine {
    /// Build the engine for `scheme` from the wallet's key material.
    ///
    /// # Errors
    /// Returns `SignerError::NoSigningKey` for watch-only wallets.
    pub fn for_scheme(scheme: SigningScheme, wallet: &Wallet) -> SignerResult<Self> {
        match scheme {
            SigningScheme::EllipticCurve => {
                Ok(Self::EllipticCurve(EllipticCurveSigner::from_wallet(wallet)?))
            }
            SigningScheme::KeyedHash => Ok(Self::KeyedHash(KeyedHashSigner::from_wallet(wallet)?)),
        }
    }

    pub fn scheme(&self) -> SigningScheme {
        match self {
            Self::EllipticCurve(_) => SigningScheme::EllipticCurve,
            Self::KeyedHash(_) => SigningScheme::KeyedHash,
        }
    }

    /// Sign a pre-image produced by the framer or the transaction serializer.
    pub fn sign(&self, bytes: &[u8]) -> SignerResult<Signature> {
        // NOTE: Do not log the signature or the key
        trace!(scheme = ?self.scheme(), len = bytes.len(), "Signing pre-image");
        match self {
            Self::EllipticCurve(signer) => signer.sign(bytes),
            Self::KeyedHash(signer) => signer.sign(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::tests::TEST_PRIVATE_KEY;
    use p256::ecdsa::signature::hazmat::PrehashVerifier;
    use p256::ecdsa::signature::Signer as _;

    fn test_wallet() -> Wallet {
        Wallet::from_login(TEST_PRIVATE_KEY).unwrap()
    }

    #[test]
    fn test_ecdsa_signature_is_128_hex_chars() {
        let signer = EllipticCurveSigner::from_wallet(&test_wallet()).unwrap();

        for payload in [&b""[..], &b"x"[..], &[0xffu8; 300][..]] {
            let sig = signer.sign(payload).unwrap();
            assert_eq!(sig.as_str().len(), 128);
            assert!(sig
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }

    #[test]
    fn test_ecdsa_signature_verifies_against_sha256_digest() {
        let wallet = test_wallet();
        let signer = EllipticCurveSigner::from_wallet(&wallet).unwrap();
        let framed = MessageFramer::frame_bytes(br#"{"order_id":"abc"}"#).unwrap();

        let sig = signer.sign(&framed).unwrap();
        let raw = hex::decode(sig.as_str()).unwrap();
        let parsed = EcdsaSignature::from_slice(&raw).unwrap();

        let digest = Sha256::digest(&framed);
        let verifying_key = wallet.signing_key().unwrap().verifying_key();
        assert!(verifying_key.verify_prehash(&digest, &parsed).is_ok());
    }

    #[test]
    fn test_ecdsa_is_deterministic_rfc6979() {
        let wallet = test_wallet();
        let signer = EllipticCurveSigner::from_wallet(&wallet).unwrap();

        let first = signer.sign(b"payload").unwrap();
        let second = signer.sign(b"payload").unwrap();
        assert_eq!(first, second);

        // Same as the crate's own hash-then-sign path
        let reference: EcdsaSignature = wallet.signing_key().unwrap().sign(b"payload");
        assert_eq!(first.as_str(), hex::encode(reference.to_bytes()));
    }

    #[test]
    fn test_fit_component_pads_and_truncates() {
        let short = fit_component(&[0x01, 0x02]);
        assert_eq!(&short[..30], &[0u8; 30]);
        assert_eq!(&short[30..], &[0x01, 0x02]);

        let mut long = vec![0x00];
        long.extend_from_slice(&[0xab; 32]);
        assert_eq!(fit_component(&long), [0xab; 32]);
    }

    #[test]
    fn test_hmac_rfc4231_case_2() {
        let signer = KeyedHashSigner::new("Jefe");
        let sig = signer.sign_message("what do ya want for nothing?").unwrap();
        assert_eq!(
            sig.as_str(),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_keyed_hash_signs_legacy_message_text() {
        let signer = KeyedHashSigner::new("secret");
        let body = br#"{"blockchain":"neo","timestamp":1533000000000}"#;
        let framed = MessageFramer::frame_bytes(body).unwrap();

        let sig = signer.sign(&framed).unwrap();
        assert_eq!(
            sig.as_str(),
            "f48209d07bf8fc4f77041177b25ed67d551c9520b348f0039abca77149a8bf25"
        );
        assert_eq!(sig, signer.sign_message(&MessageFramer::legacy_message(body)).unwrap());
    }

    #[test]
    fn test_keyed_hash_short_payload_pads_length() {
        let signer = KeyedHashSigner::new("secret");
        let framed = MessageFramer::frame_bytes(b"{}").unwrap();
        assert_eq!(
            signer.sign(&framed).unwrap().as_str(),
            "62507f90aed8a5b07432d89da06b332b64db6cf4f22eb05d8d2024424b189cf2"
        );
    }

    #[test]
    fn test_keyed_hash_unframed_bytes_use_upper_hex() {
        let signer = KeyedHashSigner::new("secret");
        let sig = signer.sign(&[0xd1, 0x01, 0x00]).unwrap();
        assert_eq!(sig, signer.sign_message("D10100").unwrap());
        assert_eq!(
            sig.as_str(),
            "9498d5a7d21d3f03360feb8d042bd5f6cae79142e68ee90e84227b69c20280dc"
        );
    }

    #[test]
    fn test_engine_scheme_selection() {
        let wallet = test_wallet();

        let ec = SignatureEngine::for_scheme(SigningScheme::EllipticCurve, &wallet).unwrap();
        assert_eq!(ec.scheme(), SigningScheme::EllipticCurve);
        assert_eq!(ec.sign(b"abc").unwrap().as_str().len(), 128);

        let hmac = SignatureEngine::for_scheme(SigningScheme::KeyedHash, &wallet).unwrap();
        assert_eq!(hmac.scheme(), SigningScheme::KeyedHash);
        assert_eq!(hmac.sign(b"abc").unwrap().as_str().len(), 64);
    }

    #[test]
    fn test_engine_requires_signing_wallet() {
        let watch = Wallet::from_login(test_wallet().address()).unwrap();
        assert!(matches!(
            SignatureEngine::for_scheme(SigningScheme::EllipticCurve, &watch),
            Err(SignerError::NoSigningKey)
        ));
    }

    #[test]
    fn test_scheme_serde_names() {
        let scheme: SigningScheme = serde_json::from_str(r#""keyed_hash""#).unwrap();
        assert_eq!(scheme, SigningScheme::KeyedHash);
    }
}
