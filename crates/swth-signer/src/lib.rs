//! Wallet, message framing, transaction serialization and signing.
//!
//! Two byte pre-images exist:
//! 1. Structured payloads (request bodies, cancellation and withdrawal
//!    confirmations) are framed by [`MessageFramer`].
//! 2. Exchange-prepared on-chain transactions are serialized by
//!    [`TransactionSerializer`] into the chain's native layout.
//!
//! Either pre-image is then signed by a [`SignatureEngine`], whose strategy is
//! fixed when it is constructed.

pub mod engine;
pub mod error;
pub mod framer;
pub mod serializer;
pub mod wallet;

pub use engine::{EllipticCurveSigner, KeyedHashSigner, Signature, SignatureEngine, SigningScheme};
pub use error::{SignerError, SignerResult};
pub use framer::MessageFramer;
pub use serializer::TransactionSerializer;
pub use wallet::{KeySource, Wallet};
