//! Signed exchange actions.
//!
//! Every action (deposit, withdrawal, order, cancellation) follows the same
//! three steps, driven by [`ActionLifecycle`]:
//!
//! 1. **create**: post the signed request; the exchange answers with a
//!    server-issued id and what must be signed next
//! 2. **sign**: serialize the prepared transaction (or frame a confirmation
//!    message) and sign it; orders sign each fill and make via [`OrderSigner`]
//! 3. **broadcast**: post the signature(s) against the id
//!
//! [`Session`] loads the registry data once and exposes the compound
//! operations plus the trade and balance read paths.

pub mod error;
pub mod lifecycle;
pub mod order_signer;
pub mod requests;
pub mod session;
pub mod timestamp;

pub use error::{ActionError, ActionResult, Stage};
pub use lifecycle::{
    ActionContext, ActionKind, ActionLifecycle, ActionPayload, ActionState, Attestation,
    PendingAction,
};
pub use order_signer::{OrderSignatures, OrderSigner};
pub use requests::{
    CancellationRequest, DepositRequest, OrderRequest, OrderSize, Signed, WithdrawalConfirmation,
    WithdrawalRequest,
};
pub use session::{Session, SessionConfig, DEFAULT_TRADE_LIMIT, MAX_TRADE_LIMIT};
pub use timestamp::{
    Clock, SystemClock, TimestampMode, TimestampSource, DEFAULT_SKEW_TOLERANCE_MS,
};
