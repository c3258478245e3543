//! Signer error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("No signing key available (watch-only wallet)")]
    NoSigningKey,

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Invalid address or script hash: {0}")]
    InvalidAddress(String),

    #[error("Failed to decode hex: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Payload too large to frame: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Payload serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SignerResult<T> = Result<T, SignerError>;
