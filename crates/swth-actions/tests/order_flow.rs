//! End-to-end order flow against a recording exchange.
//!
//! The exchange double checks order broadcasts the way the real matching
//! engine does: every fill and make of the created order needs a signature.

use std::sync::Arc;

use rust_decimal_macros::dec;
use serde_json::{json, Value};
use swth_actions::{ActionError, Clock, OrderSigner, OrderSize, Session, SessionConfig, Stage};
use swth_core::{Pair, Side};
use swth_registry::{BoxFuture, ExchangeApi, MockExchange, RegistryError, RegistryResult};
use swth_signer::{SignatureEngine, SigningScheme, Wallet};

const KEY: &str = "7d128a6d096f0c14c3a25a2b0c41cf79661bfcb4a8cc95aaaea28bde4d732344";
const NOW: u64 = 1_533_700_000_000;
const ORDER_ID: &str = "c415f943-bea8-4dbf-82e3-8460c559d8b7";

struct PinnedClock;

impl Clock for PinnedClock {
    fn now_ms(&self) -> u64 {
        NOW
    }
}

/// Recording exchange that refuses order broadcasts with unsigned entries.
struct VerifyingExchange {
    inner: MockExchange,
}

impl VerifyingExchange {
    fn check_order_broadcast(&self, body: &Value) -> RegistryResult<()> {
        let created = created_order();
        for (section, ids) in [("fills", ["f1", "f2"].as_slice()), ("makes", ["m1"].as_slice())] {
            for id in ids {
                if body["signatures"][section][*id].as_str().is_none() {
                    return Err(RegistryError::Http {
                        status: 422,
                        body: format!("{}: missing signature for {section} {id}", created["id"]),
                    });
                }
            }
        }
        Ok(())
    }
}

impl ExchangeApi for VerifyingExchange {
    fn get<'a>(
        &'a self,
        path: &'a str,
        query: &'a [(String, String)],
    ) -> BoxFuture<'a, RegistryResult<Value>> {
        self.inner.get(path, query)
    }

    fn post<'a>(&'a self, path: &'a str, body: Value) -> BoxFuture<'a, RegistryResult<Value>> {
        if path == format!("/orders/{ORDER_ID}/broadcast") {
            if let Err(e) = self.check_order_broadcast(&body) {
                return Box::pin(async move { Err(e) });
            }
        }
        self.inner.post(path, body)
    }
}

fn txn(script: &str) -> Value {
    json!({
        "type": 209,
        "version": 1,
        "attributes": [{"usage": 32, "data": "592c8a46a0d06c600f06c994d1f25e7283b8a2fe"}],
        "inputs": [],
        "outputs": [],
        "scripts": [],
        "script": script,
        "gas": 0
    })
}

fn created_order() -> Value {
    json!({
        "id": ORDER_ID,
        "blockchain": "neo",
        "contract_hash": "a195c1549e7da61b8da315765a790ac7e7633b82",
        "pair": "SWTH_NEO",
        "side": "buy",
        "price": "0.0001",
        "want_amount": "100000000000",
        "use_native_token": true,
        "status": "pending",
        "order_status": "pending",
        "fills": [
            {"id": "f1", "txn": txn("0800e1f505000000001483")},
            {"id": "f2", "txn": txn("0800e1f505000000001484")}
        ],
        "makes": [
            {"id": "m1", "txn": txn("0800e1f505000000001485")}
        ]
    })
}

fn exchange() -> Arc<VerifyingExchange> {
    let inner = MockExchange::new();
    inner.on_get(
        "/exchange/tokens",
        json!({
            "NEO": {"hash": "c56f33fc6ecfcd0c225c4ab356fee59390af8560be0e930faebe74a6daff7c9b", "decimals": 8},
            "SWTH": {"hash": "ab38352559b8b203bde5fddfa0b07d8b2525e132", "decimals": 8}
        }),
    );
    inner.on_get(
        "/exchange/contracts",
        json!({"NEO": {"V1": "0ec5712e0f7c63e4b0fea31029a28cea5e9d551f", "V2": "a195c1549e7da61b8da315765a790ac7e7633b82"}}),
    );
    inner.on_get("/exchange/timestamp", json!({"timestamp": NOW}));
    inner.on_post("/orders", created_order());

    let mut broadcast = created_order();
    broadcast["status"] = json!("processed");
    broadcast["order_status"] = json!("completed");
    inner.on_post(&format!("/orders/{ORDER_ID}/broadcast"), broadcast);

    Arc::new(VerifyingExchange { inner })
}

async fn session(api: &Arc<VerifyingExchange>) -> Session {
    Session::connect_with_clock(
        api.clone(),
        Wallet::from_login(KEY).expect("test key"),
        SessionConfig::default(),
        Arc::new(PinnedClock),
    )
    .await
    .expect("session connects")
}

#[tokio::test]
async fn test_create_sign_broadcast_order() {
    let api = exchange();
    let session = session(&api).await;
    let pair: Pair = "SWTH_NEO".parse().unwrap();

    let order = session
        .create_order(&pair, Side::Buy, dec!(0.0001), dec!(1000), true)
        .await
        .expect("order created");
    assert_eq!(order.fills.len(), 2);
    assert_eq!(order.makes.len(), 1);

    // Create body carries the framed-and-signed request
    let create = &api.inner.calls_to("/orders")[0];
    let body = create.body.as_ref().unwrap();
    assert_eq!(body["pair"], json!("SWTH_NEO"));
    assert_eq!(body["want_amount"], json!("10000000"));
    assert_eq!(body["order_type"], json!("limit"));
    assert_eq!(body["address"], json!(session.wallet().exchange_address()));

    let signatures = session.sign_order(&order).expect("order signed");
    assert!(signatures.missing(&order).is_empty());

    // Each entry is signed over its own transaction
    let engine =
        SignatureEngine::for_scheme(SigningScheme::EllipticCurve, session.wallet()).unwrap();
    assert_eq!(OrderSigner::new(&engine).sign(&order).unwrap(), signatures);
    assert_ne!(signatures.fills["f1"], signatures.fills["f2"]);

    let broadcast = session
        .broadcast_order(&order, signatures)
        .await
        .expect("order broadcast");
    assert_eq!(broadcast.status.as_deref(), Some("processed"));
    assert!(broadcast.is_completed());
}

#[tokio::test]
async fn test_place_order_runs_all_steps() {
    let api = exchange();
    let session = session(&api).await;
    let pair: Pair = "SWTH_NEO".parse().unwrap();

    let order = session
        .place_order(&pair, Side::Buy, dec!(0.0001), dec!(1000), true)
        .await
        .expect("order placed");
    assert!(order.is_completed());

    let broadcast = &api.inner.calls_to(&format!("/orders/{ORDER_ID}/broadcast"))[0];
    let body = broadcast.body.as_ref().unwrap();
    assert_eq!(body["signatures"]["fills"].as_object().unwrap().len(), 2);
    assert_eq!(body["signatures"]["makes"].as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_place_base_sized_order() {
    let api = exchange();
    let session = session(&api).await;
    let pair: Pair = "SWTH_NEO".parse().unwrap();

    let order = session
        .place_sized_order(&pair, Side::Buy, dec!(0.0001), OrderSize::Base(dec!(1)), true)
        .await
        .expect("order placed");
    assert!(order.is_completed());

    let create = &api.inner.calls_to("/orders")[0];
    let body = create.body.as_ref().unwrap();
    assert_eq!(body["want_amount"], json!("100000000"));
}

#[tokio::test]
async fn test_missing_signature_surfaces_as_broadcast_failure() {
    let api = exchange();
    let session = session(&api).await;
    let pair: Pair = "SWTH_NEO".parse().unwrap();

    let order = session
        .create_order(&pair, Side::Buy, dec!(0.0001), dec!(1000), true)
        .await
        .unwrap();
    let mut signatures = session.sign_order(&order).unwrap();
    signatures.makes.remove("m1");

    let err = session
        .broadcast_order(&order, signatures)
        .await
        .expect_err("exchange refuses incomplete signatures");

    assert_eq!(err.stage(), Some(Stage::Broadcast));
    assert!(matches!(err.root(), ActionError::Exchange { status: 422, .. }));
    assert!(!err.is_retryable());
}
