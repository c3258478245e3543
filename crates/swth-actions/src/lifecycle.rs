//! Create → sign → broadcast state machine.
//!
//! ```text
//!            create            sign             broadcast
//! (none) ──────────▶ Created ───────▶ Signed ──────────────▶ Broadcast / Confirmed
//!                       │                │  ▲ network error       │
//!                       └────────────────┴──┴──────────────▶ Rejected (exchange refused)
//! ```
//!
//! A transport failure during broadcast leaves the action `Signed` so the
//! broadcast can be retried with the same server-issued id. Create is never
//! repeated by the lifecycle itself. A caller that lost the lifecycle can
//! rebuild it from a stored [`PendingAction`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use swth_core::{Order, TransactionDescriptor};
use swth_registry::ExchangeApi;
use swth_signer::{MessageFramer, Signature, SignatureEngine, TransactionSerializer};
use tracing::{debug, info, warn};

use crate::error::{ActionError, ActionResult, Stage};
use crate::order_signer::{OrderSignatures, OrderSigner};
use crate::requests::{Signed, WithdrawalConfirmation};
use crate::timestamp::TimestampSource;

// =============================================================================
// Action kinds and payloads
// =============================================================================

/// Kind of signed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Deposit,
    Withdrawal,
    Order,
    Cancellation,
}

impl ActionKind {
    /// Collection endpoint the action is created at.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Deposit => "/deposits",
            Self::Withdrawal => "/withdrawals",
            Self::Order => "/orders",
            Self::Cancellation => "/cancellations",
        }
    }

    pub fn broadcast_path(&self, id: &str) -> String {
        format!("{}/{}/broadcast", self.path(), id)
    }
}

/// What has to be signed to broadcast a pending action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ActionPayload {
    /// Native transaction prepared by the exchange (deposit, cancellation).
    Transaction(TransactionDescriptor),
    /// Nothing prepared; the `{id, timestamp}` confirmation is signed (withdrawal).
    Confirmation,
    /// Order whose fills and makes are each signed.
    Order(Order),
}

/// Server-issued action awaiting signature and broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: String,
    pub kind: ActionKind,
    pub payload: ActionPayload,
}

#[derive(Debug, Deserialize)]
struct CreatedTransaction {
    id: String,
    transaction: TransactionDescriptor,
}

#[derive(Debug, Deserialize)]
struct CreatedId {
    id: String,
}

impl PendingAction {
    /// Interpret the create response for `kind`.
    pub fn from_response(kind: ActionKind, value: Value) -> ActionResult<Self> {
        let parse_err =
            |e: serde_json::Error| ActionError::Deserialization(format!("{kind:?} create: {e}"));

        let (id, payload) = match kind {
            ActionKind::Deposit | ActionKind::Cancellation => {
                let created: CreatedTransaction = serde_json::from_value(value).map_err(parse_err)?;
                (created.id, ActionPayload::Transaction(created.transaction))
            }
            ActionKind::Withdrawal => {
                let created: CreatedId = serde_json::from_value(value).map_err(parse_err)?;
                (created.id, ActionPayload::Confirmation)
            }
            ActionKind::Order => {
                let order: Order = serde_json::from_value(value).map_err(parse_err)?;
                (order.id.clone(), ActionPayload::Order(order))
            }
        };

        Ok(Self { id, kind, payload })
    }

    /// The created order, for order actions.
    pub fn order(&self) -> Option<&Order> {
        match &self.payload {
            ActionPayload::Order(order) => Some(order),
            _ => None,
        }
    }
}

// =============================================================================
// Attestation
// =============================================================================

/// Signature material produced by the sign step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attestation {
    /// Signature over a serialized native transaction.
    Transaction(Signature),
    /// Signature over a framed `{id, timestamp}` confirmation.
    Confirmation {
        timestamp: u64,
        signature: Signature,
    },
    /// One signature per fill and make.
    Order(OrderSignatures),
}

#[derive(Serialize)]
struct SignatureBody<'a> {
    signature: &'a Signature,
}

#[derive(Serialize)]
struct OrderBroadcastBody<'a> {
    signatures: &'a OrderSignatures,
}

impl Attestation {
    fn fits(&self, payload: &ActionPayload) -> bool {
        matches!(
            (self, payload),
            (Self::Transaction(_), ActionPayload::Transaction(_))
                | (Self::Confirmation { .. }, ActionPayload::Confirmation)
                | (Self::Order(_), ActionPayload::Order(_))
        )
    }

    /// Broadcast request body for action `id`.
    pub fn broadcast_body(&self, id: &str) -> ActionResult<Value> {
        let body = match self {
            Self::Transaction(signature) => serde_json::to_value(SignatureBody { signature })?,
            Self::Confirmation {
                timestamp,
                signature,
            } => serde_json::to_value(Signed::anonymous(
                WithdrawalConfirmation {
                    id: id.to_string(),
                    timestamp: *timestamp,
                },
                signature.clone(),
            ))?,
            Self::Order(signatures) => serde_json::to_value(OrderBroadcastBody { signatures })?,
        };
        Ok(body)
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Lifecycle states. `Confirmed` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Created,
    Signed,
    Broadcast,
    Confirmed,
    Rejected,
}

/// Collaborators shared by every lifecycle of a session.
#[derive(Clone, Copy)]
pub struct ActionContext<'a> {
    pub api: &'a dyn ExchangeApi,
    pub engine: &'a SignatureEngine,
    pub timestamps: &'a TimestampSource,
    /// Exchange address of the signing wallet.
    pub address: &'a str,
}

/// One action moving through create → sign → broadcast.
pub struct ActionLifecycle<'a> {
    ctx: ActionContext<'a>,
    kind: ActionKind,
    state: Option<ActionState>,
    pending: Option<PendingAction>,
    attestation: Option<Attestation>,
}

impl<'a> ActionLifecycle<'a> {
    pub fn new(ctx: ActionContext<'a>, kind: ActionKind) -> Self {
        Self {
            ctx,
            kind,
            state: None,
            pending: None,
            attestation: None,
        }
    }

    /// Continue from a stored pending action (state `Created`).
    pub fn resume(ctx: ActionContext<'a>, pending: PendingAction) -> Self {
        Self {
            ctx,
            kind: pending.kind,
            state: Some(ActionState::Created),
            pending: Some(pending),
            attestation: None,
        }
    }

    /// Continue from a pending action signed elsewhere (state `Signed`).
    ///
    /// # Errors
    /// `Precondition` if the attestation does not fit the action kind.
    pub fn resume_signed(
        ctx: ActionContext<'a>,
        pending: PendingAction,
        attestation: Attestation,
    ) -> ActionResult<Self> {
        if !attestation.fits(&pending.payload) {
            return Err(ActionError::Precondition(format!(
                "attestation does not match {:?} action {}",
                pending.kind, pending.id
            )));
        }
        Ok(Self {
            ctx,
            kind: pending.kind,
            state: Some(ActionState::Signed),
            pending: Some(pending),
            attestation: Some(attestation),
        })
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Current state; `None` until create has succeeded.
    pub fn state(&self) -> Option<ActionState> {
        self.state
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub fn attestation(&self) -> Option<&Attestation> {
        self.attestation.as_ref()
    }

    pub fn into_pending(self) -> Option<PendingAction> {
        self.pending
    }

    /// Sign `request` (framed), attach the wallet address, and create the
    /// action at the exchange.
    ///
    /// The request must already carry the resolved contract hash and scaled
    /// amounts.
    pub async fn create<T>(&mut self, request: &T) -> ActionResult<&PendingAction>
    where
        T: Serialize + Sync + ?Sized,
    {
        if let Some(state) = self.state {
            return Err(ActionError::Precondition(format!(
                "{:?} action already created (state {state:?})",
                self.kind
            )));
        }

        let body = self
            .signed_body(request)
            .map_err(|e| ActionError::at_stage(Stage::Create, e))?;

        debug!(kind = ?self.kind, path = self.kind.path(), "Creating action");
        let response = match self.ctx.api.post(self.kind.path(), body).await {
            Ok(response) => response,
            Err(e) => {
                if e.is_rejection() {
                    self.state = Some(ActionState::Rejected);
                }
                return Err(ActionError::at_stage(Stage::Create, e));
            }
        };

        let pending = PendingAction::from_response(self.kind, response)
            .map_err(|e| ActionError::at_stage(Stage::Create, e))?;
        info!(kind = ?self.kind, id = %pending.id, "Action created");

        self.state = Some(ActionState::Created);
        Ok(self.pending.insert(pending))
    }

    fn signed_body<T: Serialize + ?Sized>(&self, request: &T) -> ActionResult<Value> {
        let framed = MessageFramer::frame(request)?;
        let signature = self.ctx.engine.sign(&framed)?;
        Ok(serde_json::to_value(Signed::new(
            request,
            self.ctx.address,
            signature,
        ))?)
    }

    /// Produce the signature material for the pending action.
    ///
    /// # Errors
    /// `Precondition` when called before create has completed, or after the
    /// action was broadcast or rejected. No network call is made in that case.
    pub async fn sign(&mut self) -> ActionResult<&Attestation> {
        match self.state {
            Some(ActionState::Created | ActionState::Signed) => {}
            None => {
                return Err(ActionError::Precondition(format!(
                    "{:?} action signed before create completed",
                    self.kind
                )))
            }
            Some(state) => {
                return Err(ActionError::Precondition(format!(
                    "{:?} action cannot be signed in state {state:?}",
                    self.kind
                )))
            }
        }
        let pending = self
            .pending
            .as_ref()
            .ok_or_else(|| ActionError::Precondition("no pending action".to_string()))?;

        let attestation = attest(self.ctx, pending)
            .await
            .map_err(|e| ActionError::at_stage(Stage::Sign, e))?;
        debug!(kind = ?self.kind, id = %pending.id, "Action signed");

        self.state = Some(ActionState::Signed);
        Ok(self.attestation.insert(attestation))
    }

    /// Post the signature material and return the exchange's final answer.
    ///
    /// Safe to call again after a transport failure.
    pub async fn broadcast(&mut self) -> ActionResult<Value> {
        let (pending, attestation) = match (self.state, &self.pending, &self.attestation) {
            (Some(ActionState::Signed), Some(pending), Some(attestation)) => (pending, attestation),
            (None | Some(ActionState::Created), ..) => {
                return Err(ActionError::Precondition(format!(
                    "{:?} action broadcast before sign",
                    self.kind
                )))
            }
            (state, ..) => {
                return Err(ActionError::Precondition(format!(
                    "{:?} action cannot be broadcast in state {state:?}",
                    self.kind
                )))
            }
        };

        let path = self.kind.broadcast_path(&pending.id);
        let body = attestation
            .broadcast_body(&pending.id)
            .map_err(|e| ActionError::at_stage(Stage::Broadcast, e))?;

        match self.ctx.api.post(&path, body).await {
            Ok(response) => {
                let state = if is_confirmed(&response) {
                    ActionState::Confirmed
                } else {
                    ActionState::Broadcast
                };
                info!(kind = ?self.kind, id = %pending.id, ?state, "Action broadcast");
                self.state = Some(state);
                Ok(response)
            }
            Err(e) => {
                let err = ActionError::from(e);
                // Stay Signed exactly when the caller is told a retry may succeed.
                if err.is_retryable() {
                    warn!(kind = ?self.kind, id = %pending.id, error = %err, "Broadcast failed, retryable");
                } else {
                    warn!(kind = ?self.kind, id = %pending.id, error = %err, "Broadcast rejected");
                    self.state = Some(ActionState::Rejected);
                }
                Err(ActionError::at_stage(Stage::Broadcast, err))
            }
        }
    }
}

async fn attest(ctx: ActionContext<'_>, pending: &PendingAction) -> ActionResult<Attestation> {
    match &pending.payload {
        ActionPayload::Transaction(txn) => {
            let bytes = TransactionSerializer::serialize(txn)?;
            Ok(Attestation::Transaction(ctx.engine.sign(&bytes)?))
        }
        ActionPayload::Confirmation => {
            let timestamp = ctx.timestamps.now_ms(ctx.api).await?;
            let framed = MessageFramer::frame(&WithdrawalConfirmation {
                id: pending.id.clone(),
                timestamp,
            })?;
            Ok(Attestation::Confirmation {
                timestamp,
                signature: ctx.engine.sign(&framed)?,
            })
        }
        ActionPayload::Order(order) => Ok(Attestation::Order(OrderSigner::new(ctx.engine).sign(order)?)),
    }
}

fn is_confirmed(response: &Value) -> bool {
    let status = response.get("status").and_then(Value::as_str);
    let order_status = response.get("order_status").and_then(Value::as_str);
    matches!(status, Some("confirmed" | "success" | "completed"))
        || order_status == Some("completed")
}
