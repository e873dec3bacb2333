use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use marketplace_ledger::{MemoryLedger, TransactionBuilder};
use marketplace_provider::handlers::{self, AppState};
use marketplace_provider::replay_cache::ReplayCache;
use marketplace_provider::service::EchoServiceHandler;
use marketplace_types::{PaymentChallenge, PaymentProof};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn build_state() -> Arc<AppState<MemoryLedger>> {
    Arc::new(AppState {
        ledger: MemoryLedger::new(),
        replay_cache: ReplayCache::new(60),
        service_handler: Arc::new(EchoServiceHandler),
        wallet_address: "provider-wallet".into(),
        price_minor: 100,
        token_mint: "USDC".into(),
        network: "base-sepolia".into(),
        facilitator_url: "http://localhost:9100".into(),
        challenge_ttl_secs: 60,
    })
}

async fn deliver_body() -> Value {
    json!({ "rfp_id": "rfp-1", "task_type": "price_feed", "requirements": {} })
}

#[tokio::test]
async fn first_deliver_without_proof_returns_402_challenge() {
    let state = build_state();
    let app = handlers::routes(state);

    let request = Request::builder()
        .method("POST")
        .uri("/deliver")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&deliver_body().await).unwrap()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let challenge: PaymentChallenge = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(challenge.recipient, "provider-wallet");
    assert_eq!(challenge.amount_minor, 100);
}

#[tokio::test]
async fn valid_proof_unlocks_service_data() {
    let state = build_state();
    state
        .ledger
        .record_settlement("sig-1", "provider-wallet", 100, "USDC")
        .await
        .unwrap();
    let app = handlers::routes(state);

    let proof = PaymentProof {
        signature: "sig-1".into(),
        network: "base-sepolia".into(),
    };
    let request = Request::builder()
        .method("POST")
        .uri("/deliver")
        .header("content-type", "application/json")
        .header("X-Payment-Response", serde_json::to_string(&proof).unwrap())
        .body(Body::from(serde_json::to_vec(&deliver_body().await).unwrap()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["payment_signature"], "sig-1");
}

#[tokio::test]
async fn replayed_signature_is_rejected_on_second_call() {
    let state = build_state();
    state
        .ledger
        .record_settlement("sig-2", "provider-wallet", 100, "USDC")
        .await
        .unwrap();
    let app = handlers::routes(state);

    let proof = PaymentProof {
        signature: "sig-2".into(),
        network: "base-sepolia".into(),
    };
    let make_request = || {
        Request::builder()
            .method("POST")
            .uri("/deliver")
            .header("content-type", "application/json")
            .header("X-Payment-Response", serde_json::to_string(&proof).unwrap())
            .body(Body::from(serde_json::to_vec(&json!({
                "rfp_id": "rfp-1", "task_type": "price_feed", "requirements": {}
            })).unwrap()))
            .unwrap()
    };

    let first = app.clone().oneshot(make_request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(make_request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn unconfirmed_signature_returns_402() {
    let state = build_state();
    let app = handlers::routes(state);

    let proof = PaymentProof {
        signature: "never-settled".into(),
        network: "base-sepolia".into(),
    };
    let request = Request::builder()
        .method("POST")
        .uri("/deliver")
        .header("content-type", "application/json")
        .header("X-Payment-Response", serde_json::to_string(&proof).unwrap())
        .body(Body::from(serde_json::to_vec(&deliver_body().await).unwrap()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn unconfirmed_signature_is_not_poisoned_into_replay_cache() {
    // A signature that fails confirmation (e.g. a transient ledger lag)
    // must remain retryable once it does settle, rather than being
    // permanently rejected as a replay.
    let state = build_state();
    let app = handlers::routes(state);

    let proof = PaymentProof {
        signature: "sig-3".into(),
        network: "base-sepolia".into(),
    };
    let make_request = || {
        Request::builder()
            .method("POST")
            .uri("/deliver")
            .header("content-type", "application/json")
            .header("X-Payment-Response", serde_json::to_string(&proof).unwrap())
            .body(Body::from(serde_json::to_vec(&json!({
                "rfp_id": "rfp-1", "task_type": "price_feed", "requirements": {}
            })).unwrap()))
            .unwrap()
    };

    let first = app.clone().oneshot(make_request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::PAYMENT_REQUIRED);

    state
        .ledger
        .record_settlement("sig-3", "provider-wallet", 100, "USDC")
        .await
        .unwrap();
    let second = app.oneshot(make_request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
}
