//! Registry and transport error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Unexpected response shape: {0}")]
    Deserialization(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    #[error("Unknown contract version {version} for chain {chain}")]
    UnknownVersion { chain: String, version: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl RegistryError {
    /// Whether the exchange answered and refused the request.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Http { status, .. } if (400..500).contains(status))
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
