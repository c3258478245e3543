//! Exchange session: registry data, wallet and signing engine, loaded once.
//!
//! Compound operations chain create → sign → broadcast but are not
//! transactional. If one fails after create, the action is left pending at
//! the exchange; its id is logged and the caller can drive it to completion
//! through [`Session::resume`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use swth_core::{Balances, Order, Pair, Side, TradeDetail, WithdrawalResult};
use swth_registry::{
    AmountScaler, ContractRegistry, ExchangeApi, ResolvedContract, TokenCatalog,
};
use swth_signer::{SignatureEngine, SignerError, SigningScheme, Wallet};
use tracing::{debug, info, warn};

use crate::error::{ActionError, ActionResult, Stage};
use crate::lifecycle::{
    ActionContext, ActionKind, ActionLifecycle, ActionPayload, Attestation, PendingAction,
};
use crate::order_signer::{OrderSignatures, OrderSigner};
use crate::requests::{
    CancellationRequest, DepositRequest, OrderRequest, OrderSize, WithdrawalRequest,
    ORDER_TYPE_LIMIT,
};
use crate::timestamp::{Clock, SystemClock, TimestampMode, TimestampSource, DEFAULT_SKEW_TOLERANCE_MS};

const TRADES_PATH: &str = "/trades";
const BALANCES_PATH: &str = "/balances";

/// Trade count the exchange returns when no limit is sent.
pub const DEFAULT_TRADE_LIMIT: u32 = 5000;
/// Largest trade count the exchange accepts.
pub const MAX_TRADE_LIMIT: u32 = 10_000;

/// Session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Chain name sent in request bodies (e.g. `neo`).
    pub blockchain: String,
    /// Contract version; empty selects the newest.
    pub contract_version: String,
    pub signing_scheme: SigningScheme,
    pub clock_skew_tolerance_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            blockchain: "neo".to_string(),
            contract_version: String::new(),
            signing_scheme: SigningScheme::EllipticCurve,
            clock_skew_tolerance_ms: DEFAULT_SKEW_TOLERANCE_MS,
        }
    }
}

/// Fully initialized client for one wallet.
pub struct Session {
    api: Arc<dyn ExchangeApi>,
    wallet: Wallet,
    exchange_address: String,
    engine: Option<SignatureEngine>,
    scaler: AmountScaler,
    contracts: ContractRegistry,
    contract: ResolvedContract,
    blockchain: String,
    timestamps: TimestampSource,
}

impl Session {
    /// Load tokens and contracts, resolve the contract, pick the timestamp
    /// mode and build the signing engine.
    pub async fn connect(
        api: Arc<dyn ExchangeApi>,
        wallet: Wallet,
        config: SessionConfig,
    ) -> ActionResult<Self> {
        Self::connect_with_clock(api, wallet, config, Arc::new(SystemClock)).await
    }

    pub async fn connect_with_clock(
        api: Arc<dyn ExchangeApi>,
        wallet: Wallet,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> ActionResult<Self> {
        let (tokens, contracts) = tokio::try_join!(
            TokenCatalog::load(api.as_ref()),
            ContractRegistry::load(api.as_ref())
        )?;

        let contract =
            contracts.resolve_contract_hash(&config.blockchain, &config.contract_version)?;

        let timestamps =
            TimestampSource::calibrate(api.as_ref(), clock, config.clock_skew_tolerance_ms)
                .await?;

        let engine = if wallet.can_sign() {
            Some(SignatureEngine::for_scheme(config.signing_scheme, &wallet)?)
        } else {
            warn!(address = %wallet.address(), "Watch-only wallet, signed actions disabled");
            None
        };

        info!(
            address = %wallet.address(),
            chain = %contract.chain,
            contract_version = %contract.version,
            contract_hash = %contract.hash,
            tokens = tokens.len(),
            timestamps = ?timestamps.mode(),
            "Session ready"
        );

        Ok(Self {
            api,
            exchange_address: wallet.exchange_address(),
            wallet,
            engine,
            scaler: AmountScaler::new(Arc::new(tokens)),
            contracts,
            contract,
            blockchain: config.blockchain.to_lowercase(),
            timestamps,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn tokens(&self) -> &TokenCatalog {
        self.scaler.catalog()
    }

    pub fn scaler(&self) -> &AmountScaler {
        &self.scaler
    }

    pub fn contracts(&self) -> &ContractRegistry {
        &self.contracts
    }

    /// Contract every action of this session is signed against.
    pub fn contract(&self) -> &ResolvedContract {
        &self.contract
    }

    pub fn timestamp_mode(&self) -> TimestampMode {
        self.timestamps.mode()
    }

    pub fn can_sign(&self) -> bool {
        self.engine.is_some()
    }

    /// Signing context for lifecycles of this session.
    ///
    /// # Errors
    /// `Signing` for watch-only wallets.
    pub fn context(&self) -> ActionResult<ActionContext<'_>> {
        let engine = self.engine.as_ref().ok_or(SignerError::NoSigningKey)?;
        Ok(ActionContext {
            api: self.api.as_ref(),
            engine,
            timestamps: &self.timestamps,
            address: &self.exchange_address,
        })
    }

    /// Fresh lifecycle for a manually driven action.
    pub fn lifecycle(&self, kind: ActionKind) -> ActionResult<ActionLifecycle<'_>> {
        Ok(ActionLifecycle::new(self.context()?, kind))
    }

    /// Lifecycle continuing a stored pending action.
    pub fn resume(&self, pending: PendingAction) -> ActionResult<ActionLifecycle<'_>> {
        Ok(ActionLifecycle::resume(self.context()?, pending))
    }

    async fn timestamp(&self) -> ActionResult<u64> {
        self.timestamps
            .now_ms(self.api.as_ref())
            .await
            .map_err(|e| ActionError::at_stage(Stage::Create, e))
    }

    // =========================================================================
    // Deposits and withdrawals
    // =========================================================================

    /// Build the deposit message for `amount` of `asset`.
    pub async fn deposit_request(&self, asset: &str, amount: Decimal) -> ActionResult<DepositRequest> {
        let token = self.scaler.catalog().resolve(asset)?;
        Ok(DepositRequest {
            amount: self.scaler.to_on_chain(&token.symbol, amount)?,
            asset_id: token.asset_id.clone(),
            blockchain: self.blockchain.clone(),
            contract_hash: self.contract.hash.clone(),
            timestamp: self.timestamp().await?,
        })
    }

    /// Build the withdrawal message for `amount` of `asset`.
    pub async fn withdrawal_request(
        &self,
        asset: &str,
        amount: Decimal,
    ) -> ActionResult<WithdrawalRequest> {
        let deposit = self.deposit_request(asset, amount).await?;
        Ok(WithdrawalRequest {
            amount: deposit.amount,
            asset_id: deposit.asset_id,
            blockchain: deposit.blockchain,
            contract_hash: deposit.contract_hash,
            timestamp: deposit.timestamp,
        })
    }

    /// Deposit `amount` of `asset` into the exchange contract.
    ///
    /// Returns the exchange's answer to the broadcast.
    pub async fn deposit(&self, asset: &str, amount: Decimal) -> ActionResult<Value> {
        let mut action = self.lifecycle(ActionKind::Deposit)?;
        let request = self.deposit_request(asset, amount).await?;
        run(&mut action, &request).await
    }

    /// Withdraw `amount` of `asset` from the exchange contract.
    pub async fn withdraw(&self, asset: &str, amount: Decimal) -> ActionResult<WithdrawalResult> {
        let mut action = self.lifecycle(ActionKind::Withdrawal)?;
        let request = self.withdrawal_request(asset, amount).await?;
        parse(run(&mut action, &request).await?)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Build the order message for `amount` of the traded token.
    /// `want_amount = price × amount`, scaled with the pair's base asset.
    pub async fn order_request(
        &self,
        pair: &Pair,
        side: Side,
        price: Decimal,
        amount: Decimal,
        use_native_tokens: bool,
    ) -> ActionResult<OrderRequest> {
        self.sized_order_request(pair, side, price, OrderSize::Trade(amount), use_native_tokens)
            .await
    }

    /// Build the order message for an explicitly sized order.
    pub async fn sized_order_request(
        &self,
        pair: &Pair,
        side: Side,
        price: Decimal,
        size: OrderSize,
        use_native_tokens: bool,
    ) -> ActionResult<OrderRequest> {
        let amount = size.amount();
        if price <= Decimal::ZERO || amount <= Decimal::ZERO {
            return Err(ActionError::Validation(format!(
                "price and amount must be positive (price {price}, amount {amount})"
            )));
        }
        let want_amount = size
            .want_amount(price)
            .ok_or_else(|| ActionError::Validation(format!("{price} x {amount} overflows")))?;

        Ok(OrderRequest {
            blockchain: self.blockchain.clone(),
            contract_hash: self.contract.hash.to_lowercase(),
            order_type: ORDER_TYPE_LIMIT.to_string(),
            pair: pair.clone(),
            price: OrderRequest::format_price(price),
            side,
            want_amount: self.scaler.to_on_chain(&pair.to_string(), want_amount)?,
            use_native_tokens,
            timestamp: self.timestamp().await?,
        })
    }

    /// Create an order for `amount` of the traded token. The returned order
    /// carries the fills and makes that must be signed before
    /// [`Session::broadcast_order`].
    pub async fn create_order(
        &self,
        pair: &Pair,
        side: Side,
        price: Decimal,
        amount: Decimal,
        use_native_tokens: bool,
    ) -> ActionResult<Order> {
        self.create_sized_order(pair, side, price, OrderSize::Trade(amount), use_native_tokens)
            .await
    }

    pub async fn create_sized_order(
        &self,
        pair: &Pair,
        side: Side,
        price: Decimal,
        size: OrderSize,
        use_native_tokens: bool,
    ) -> ActionResult<Order> {
        let mut action = self.lifecycle(ActionKind::Order)?;
        let request = self
            .sized_order_request(pair, side, price, size, use_native_tokens)
            .await?;
        let pending = action.create(&request).await?;

        pending.order().cloned().ok_or_else(|| {
            ActionError::Deserialization(format!("order create returned no order for {}", pending.id))
        })
    }

    /// Sign every fill and make of a created order.
    pub fn sign_order(&self, order: &Order) -> ActionResult<OrderSignatures> {
        let ctx = self.context()?;
        OrderSigner::new(ctx.engine)
            .sign(order)
            .map_err(|e| ActionError::at_stage(Stage::Sign, e))
    }

    /// Broadcast a created order with its signature maps.
    ///
    /// Signatures are sent as given. If some fill or make is unsigned the
    /// exchange refuses the broadcast, which surfaces as a broadcast
    /// `StageFailure`.
    pub async fn broadcast_order(
        &self,
        order: &Order,
        signatures: OrderSignatures,
    ) -> ActionResult<Order> {
        let missing = signatures.missing(order);
        if !missing.is_empty() {
            warn!(order_id = %order.id, ?missing, "Broadcasting order with unsigned entries");
        }

        let pending = PendingAction {
            id: order.id.clone(),
            kind: ActionKind::Order,
            payload: ActionPayload::Order(order.clone()),
        };
        let mut action =
            ActionLifecycle::resume_signed(self.context()?, pending, Attestation::Order(signatures))?;

        parse(action.broadcast().await?)
    }

    /// Create, sign and broadcast a limit order for `amount` of the traded
    /// token at `price`.
    pub async fn place_order(
        &self,
        pair: &Pair,
        side: Side,
        price: Decimal,
        amount: Decimal,
        use_native_tokens: bool,
    ) -> ActionResult<Order> {
        self.place_sized_order(pair, side, price, OrderSize::Trade(amount), use_native_tokens)
            .await
    }

    /// Create, sign and broadcast an explicitly sized limit order.
    pub async fn place_sized_order(
        &self,
        pair: &Pair,
        side: Side,
        price: Decimal,
        size: OrderSize,
        use_native_tokens: bool,
    ) -> ActionResult<Order> {
        let order = self
            .create_sized_order(pair, side, price, size, use_native_tokens)
            .await?;
        info!(
            order_id = %order.id,
            %pair,
            %side,
            ?size,
            fills = order.fills.len(),
            makes = order.makes.len(),
            "Order created"
        );

        let signatures = self.sign_order(&order).map_err(|e| {
            warn!(order_id = %order.id, error = %e, "Order left pending after sign failure");
            e
        })?;
        self.broadcast_order(&order, signatures).await
    }

    /// Cancel an open order.
    pub async fn cancel_order(&self, order_id: &str) -> ActionResult<Order> {
        let mut action = self.lifecycle(ActionKind::Cancellation)?;
        let request = CancellationRequest {
            order_id: order_id.to_string(),
            timestamp: self.timestamp().await?,
        };
        parse(run(&mut action, &request).await?)
    }

    // =========================================================================
    // Read paths
    // =========================================================================

    /// Executed trades for `pair` on this session's contract.
    ///
    /// `limit` is clamped to `1..=10000` and only sent when it differs from
    /// the exchange default of 5000.
    ///
    /// # Errors
    /// `Validation` if `from > to`, before any network call.
    pub async fn get_trades(
        &self,
        pair: &Pair,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: Option<u32>,
    ) -> ActionResult<Vec<TradeDetail>> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(ActionError::Validation(format!(
                    "trade range start {from} is after end {to}"
                )));
            }
            if from == to {
                debug!(%pair, "Empty trade range");
                return Ok(Vec::new());
            }
        }

        let limit = limit
            .unwrap_or(DEFAULT_TRADE_LIMIT)
            .clamp(1, MAX_TRADE_LIMIT);

        let mut query = vec![
            ("blockchain".to_string(), self.blockchain.clone()),
            ("contract_hash".to_string(), self.contract.hash.clone()),
            ("pair".to_string(), pair.to_string()),
        ];
        if limit != DEFAULT_TRADE_LIMIT {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(from) = from {
            query.push(("from".to_string(), from.timestamp().to_string()));
        }
        if let Some(to) = to {
            query.push(("to".to_string(), to.timestamp().to_string()));
        }

        parse(self.api.get(TRADES_PATH, &query).await?)
    }

    /// Contract balances of `address` (default: this wallet) across every
    /// contract version deployed on this chain.
    pub async fn get_balances(&self, address: Option<&str>) -> ActionResult<Balances> {
        let address = address.unwrap_or(&self.exchange_address);

        let mut query = vec![("addresses[]".to_string(), address.to_string())];
        query.extend(
            self.contract
                .history
                .iter()
                .map(|hash| ("contract_hashes[]".to_string(), hash.clone())),
        );

        parse(self.api.get(BALANCES_PATH, &query).await?)
    }
}

/// Drive a fresh lifecycle through all three steps.
async fn run<T>(action: &mut ActionLifecycle<'_>, request: &T) -> ActionResult<Value>
where
    T: serde::Serialize + Sync,
{
    action.create(request).await?;

    let outcome = match action.sign().await.map(|_| ()) {
        Ok(()) => action.broadcast().await,
        Err(e) => Err(e),
    };

    if let Err(e) = &outcome {
        if let Some(pending) = action.pending() {
            warn!(
                kind = ?pending.kind,
                id = %pending.id,
                error = %e,
                "Action left pending at the exchange"
            );
        }
    }
    outcome
}

fn parse<T: DeserializeOwned>(value: Value) -> ActionResult<T> {
    serde_json::from_value(value).map_err(|e| ActionError::Deserialization(e.to_string()))
}
