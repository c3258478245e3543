//! Action error types.
//!
//! Registry and signer errors are folded into one taxonomy so callers can
//! match on the kind of failure without knowing which crate raised it.
//! Failures inside a compound operation are wrapped in `StageFailure`.

use std::fmt;

use swth_core::CoreError;
use swth_registry::RegistryError;
use swth_signer::SignerError;
use thiserror::Error;

/// Step of the create → sign → broadcast lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Create,
    Sign,
    Broadcast,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Sign => write!(f, "sign"),
            Self::Broadcast => write!(f, "broadcast"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Exchange refused request (HTTP {status}): {body}")]
    Exchange { status: u16, body: String },

    #[error("Unexpected response shape: {0}")]
    Deserialization(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    #[error("Unknown contract version {version} for chain {chain}")]
    UnknownVersion { chain: String, version: String },

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Payload too large to frame: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("{stage} stage failed: {source}")]
    StageFailure {
        stage: Stage,
        #[source]
        source: Box<ActionError>,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Precondition violated: {0}")]
    Precondition(String),
}

impl ActionError {
    /// Wrap `err` as a failure of `stage`. Already-staged errors keep their
    /// original stage.
    pub fn at_stage(stage: Stage, err: impl Into<ActionError>) -> Self {
        match err.into() {
            staged @ Self::StageFailure { .. } => staged,
            err => Self::StageFailure {
                stage,
                source: Box::new(err),
            },
        }
    }

    /// Stage at which a compound operation failed, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::StageFailure { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The underlying error with any stage wrapper removed.
    pub fn root(&self) -> &ActionError {
        match self {
            Self::StageFailure { source, .. } => source.root(),
            err => err,
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Transport failures and 5xx answers qualify; a 4xx refusal is final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.root(),
            Self::Network(_) | Self::Exchange { status: 500..=599, .. }
        )
    }
}

impl From<RegistryError> for ActionError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Network(msg) | RegistryError::HttpClient(msg) => Self::Network(msg),
            RegistryError::Http { status, body } => Self::Exchange { status, body },
            RegistryError::Deserialization(msg) => Self::Deserialization(msg),
            RegistryError::UnknownAsset(symbol) => Self::UnknownAsset(symbol),
            RegistryError::UnknownChain(chain) => Self::UnknownChain(chain),
            RegistryError::UnknownVersion { chain, version } => {
                Self::UnknownVersion { chain, version }
            }
            RegistryError::InvalidAmount(msg) => Self::Validation(msg),
        }
    }
}

impl From<SignerError> for ActionError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::PayloadTooLarge { len, max } => Self::PayloadTooLarge { len, max },
            SignerError::InvalidTransaction(msg) => {
                Self::Deserialization(format!("transaction: {msg}"))
            }
            other => Self::Signing(other.to_string()),
        }
    }
}

impl From<CoreError> for ActionError {
    fn from(err: CoreError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialization(err.to_string())
    }
}

pub type ActionResult<T> = Result<T, ActionError>;
