//! NEO wallet: address, script hash, and optional P-256 keypair.
//!
//! A wallet is created once from one login value and is immutable afterward:
//! - address (`A...`, base58check with version byte `0x17`): watch-only
//! - script hash (`0x` + 40 hex, big-endian display): watch-only
//! - WIF (`K...`/`L...`) or raw 64-hex private key: can sign
//!
//! Security notes:
//! - Private key bytes live in `Zeroizing` buffers and are wiped on drop.
//! - `Debug` never prints key material.
//! - Never log private key material.

use std::fmt;
use std::path::PathBuf;

use p256::ecdsa::SigningKey;
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{SignerError, SignerResult};

/// NEO address version byte.
const ADDRESS_VERSION: u8 = 0x17;
/// Base58 length of a NEO address.
const ADDRESS_LEN: usize = 34;
/// WIF version byte.
const WIF_VERSION: u8 = 0x80;
/// WIF compression flag.
const WIF_COMPRESSED: u8 = 0x01;
/// `PUSHBYTES33` opcode opening a single-signature verification script.
const PUSHBYTES33: u8 = 0x21;
/// `CHECKSIG` opcode closing a single-signature verification script.
const CHECKSIG: u8 = 0xac;

// =============================================================================
// KeySource
// =============================================================================

/// Source of the wallet login value.
///
/// In TOML: `key = { source = "env_var", var_name = "SWTH_KEY" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum KeySource {
    /// Load from environment variable (development).
    EnvVar { var_name: String },
    /// Load from file (production, recommend 0600 permissions).
    File { path: PathBuf },
}

impl KeySource {
    /// Read the login value (address, script hash, WIF, or hex key).
    pub fn read(&self) -> SignerResult<Zeroizing<String>> {
        let raw = match self {
            KeySource::EnvVar { var_name } => std::env::var(var_name)
                .map_err(|_| SignerError::EnvVarNotFound(var_name.clone()))?,
            KeySource::File { path } => std::fs::read_to_string(path)?,
        };
        Ok(Zeroizing::new(raw.trim().to_string()))
    }
}

// =============================================================================
// Wallet
// =============================================================================

/// Wallet identity plus, when loaded from a private key, its keypair.
pub struct Wallet {
    address: String,
    /// Script hash in wire (little-endian) byte order.
    script_hash: [u8; 20],
    /// Compressed SEC1 public key.
    public_key: Option<[u8; 33]>,
    private_key: Option<Zeroizing<Vec<u8>>>,
    signing_key: Option<SigningKey>,
}

impl Wallet {
    /// Load a wallet from the given key source.
    pub fn load(source: &KeySource) -> SignerResult<Self> {
        let value = source.read()?;
        Self::from_login(&value)
    }

    /// Build a wallet from any supported login value.
    pub fn from_login(value: &str) -> SignerResult<Self> {
        let value = value.trim();
        // Raw hex keys first: either case, and they may start with 'A'
        if value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit()) {
            let bytes = Zeroizing::new(hex::decode(value)?);
            Self::from_private_key(&bytes)
        } else if value.starts_with("0x") {
            Self::from_script_hash(value)
        } else if value.len() == ADDRESS_LEN && value.starts_with('A') {
            Self::from_address(value)
        } else {
            Self::from_wif(value)
        }
    }

    /// Watch-only wallet from a base58check address.
    pub fn from_address(address: &str) -> SignerResult<Self> {
        let decoded = bs58::decode(address)
            .with_check(Some(ADDRESS_VERSION))
            .into_vec()
            .map_err(|e| SignerError::InvalidAddress(format!("{address}: {e}")))?;
        if decoded.len() != 21 {
            return Err(SignerError::InvalidAddress(format!(
                "{address}: expected 21 payload bytes, got {}",
                decoded.len()
            )));
        }

        let mut script_hash = [0u8; 20];
        script_hash.copy_from_slice(&decoded[1..]);

        Ok(Self {
            address: address.to_string(),
            script_hash,
            public_key: None,
            private_key: None,
            signing_key: None,
        })
    }

    /// Watch-only wallet from a `0x`-prefixed big-endian script hash.
    pub fn from_script_hash(value: &str) -> SignerResult<Self> {
        let trimmed = value.trim_start_matches("0x");
        let mut bytes = hex::decode(trimmed)?;
        if bytes.len() != 20 {
            return Err(SignerError::InvalidAddress(format!(
                "{value}: expected 20 bytes, got {}",
                bytes.len()
            )));
        }
        bytes.reverse();

        let mut script_hash = [0u8; 20];
        script_hash.copy_from_slice(&bytes);

        Ok(Self {
            address: encode_address(&script_hash),
            script_hash,
            public_key: None,
            private_key: None,
            signing_key: None,
        })
    }

    /// Signing wallet from a compressed WIF string.
    pub fn from_wif(wif: &str) -> SignerResult<Self> {
        let decoded = Zeroizing::new(
            bs58::decode(wif)
                .with_check(Some(WIF_VERSION))
                .into_vec()
                .map_err(|e| SignerError::InvalidKey(format!("WIF decode failed: {e}")))?,
        );
        if decoded.len() != 34 || decoded[33] != WIF_COMPRESSED {
            return Err(SignerError::InvalidKey(
                "WIF must encode a 32-byte compressed key".to_string(),
            ));
        }
        Self::from_private_key(&decoded[1..33])
    }

    /// Signing wallet from raw 32-byte private key.
    pub fn from_private_key(secret: &[u8]) -> SignerResult<Self> {
        let signing_key =
            SigningKey::from_slice(secret).map_err(|e| SignerError::InvalidKey(e.to_string()))?;

        let encoded = signing_key.verifying_key().to_encoded_point(true);
        let mut public_key = [0u8; 33];
        public_key.copy_from_slice(encoded.as_bytes());

        let script_hash = script_hash_for(&public_key);

        Ok(Self {
            address: encode_address(&script_hash),
            script_hash,
            public_key: Some(public_key),
            private_key: Some(Zeroizing::new(secret.to_vec())),
            signing_key: Some(signing_key),
        })
    }

    /// Base58check address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Script hash in conventional display form (`0x` + big-endian hex).
    pub fn script_hash(&self) -> String {
        format!("0x{}", self.exchange_address())
    }

    /// Script hash as sent in request bodies (big-endian hex, no prefix).
    pub fn exchange_address(&self) -> String {
        let mut display = self.script_hash;
        display.reverse();
        hex::encode(display)
    }

    /// Compressed public key, hex. `None` for watch-only wallets.
    pub fn public_key(&self) -> Option<String> {
        self.public_key.map(hex::encode)
    }

    /// Whether this wallet can produce signatures.
    pub fn can_sign(&self) -> bool {
        self.signing_key.is_some()
    }

    /// P-256 signing key.
    pub fn signing_key(&self) -> SignerResult<&SigningKey> {
        self.signing_key.as_ref().ok_or(SignerError::NoSigningKey)
    }

    /// Raw private key bytes.
    pub fn private_key(&self) -> SignerResult<&[u8]> {
        self.private_key
            .as_deref()
            .map(|k| k.as_slice())
            .ok_or(SignerError::NoSigningKey)
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("script_hash", &self.script_hash())
            .field("can_sign", &self.can_sign())
            .finish()
    }
}

/// RIPEMD160(SHA256(0x21 ‖ pubkey ‖ 0xac)).
fn script_hash_for(public_key: &[u8; 33]) -> [u8; 20] {
    let mut script = Vec::with_capacity(35);
    script.push(PUSHBYTES33);
    script.extend_from_slice(public_key);
    script.push(CHECKSIG);

    let sha = Sha256::digest(&script);
    let ripe = Ripemd160::digest(sha);

    let mut out = [0u8; 20];
    out.copy_from_slice(&ripe);
    out
}

fn encode_address(script_hash: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(ADDRESS_VERSION);
    payload.extend_from_slice(script_hash);
    bs58::encode(payload).with_check().into_string()
}
