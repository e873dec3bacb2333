//! End-to-end exercise of the registry HTTP surface via `tower::ServiceExt::oneshot`,
//! without binding a real TCP listener.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use marketplace_registry::handlers;
use marketplace_store::Store;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(b) => Body::from(serde_json::to_vec(&b).unwrap()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn sample_agent(id: &str) -> Value {
    json!({
        "agent_id": id,
        "name": "Test Agent",
        "agent_type": "data_provider",
        "endpoint_url": "http://localhost:9000",
        "wallet_address": "0xabc",
        "capabilities": ["price_feed"],
        "pricing": {},
        "reputation": 0.0,
        "total_tasks": 0,
        "successful_tasks": 0,
        "created_at": "0",
    })
}

#[tokio::test]
async fn health_check_responds_ok() {
    let app = handlers::routes(Store::new());
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn full_rfp_lifecycle_over_http() {
    let app = handlers::routes(Store::new());

    let (status, _) = send(&app, "POST", "/agents/register", Some(sample_agent("consumer-1"))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/agents/register", Some(sample_agent("provider-1"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, rfp) = send(
        &app,
        "POST",
        "/rfp/create",
        Some(json!({
            "task_type": "price_feed",
            "requirements": {},
            "max_budget_usdc": "10.00",
            "required_delivery_time_ms": 2000,
            "requester_agent_id": "consumer-1",
            "expires_at": "1000000",
            "bidding_deadline": "999000",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rfp_id = rfp["rfp_id"].as_str().unwrap().to_string();

    let (status, bid) = send(
        &app,
        "POST",
        &format!("/rfp/{rfp_id}/bid"),
        Some(json!({
            "bidder_agent_id": "provider-1",
            "bid_price_usdc": "5.00",
            "estimated_delivery_time_ms": 1000,
            "confidence_score": 0.9,
            "proposal": null,
            "expires_at": "4102444800",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let bid_id = bid["bid_id"].as_str().unwrap().to_string();

    let (status, bids) = send(&app, "GET", &format!("/rfp/{rfp_id}/bids"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bids.as_array().unwrap().len(), 1);

    let (status, assignment) = send(
        &app,
        "POST",
        &format!("/rfp/{rfp_id}/select"),
        Some(json!({ "bid_id": bid_id, "selector_agent_id": "consumer-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let assignment_id = assignment["assignment_id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/rfp/{rfp_id}/select"),
        Some(json!({ "bid_id": bid_id, "selector_agent_id": "consumer-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/assignments/{assignment_id}/delivery"),
        Some(json!({ "tx_signature": "sig-123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/agents/provider-1/rate",
        Some(json!({
            "rater_agent_id": "consumer-1",
            "assignment_id": assignment_id,
            "stars": 4.5,
            "review": "great",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, reputation) = send(&app, "GET", "/agents/provider-1/reputation", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reputation["count"], 1);
}

#[tokio::test]
async fn select_rejects_non_requester() {
    let app = handlers::routes(Store::new());
    send(&app, "POST", "/agents/register", Some(sample_agent("consumer-1"))).await;
    let (_, rfp) = send(
        &app,
        "POST",
        "/rfp/create",
        Some(json!({
            "task_type": "price_feed",
            "requirements": {},
            "max_budget_usdc": "10.00",
            "required_delivery_time_ms": 2000,
            "requester_agent_id": "consumer-1",
            "expires_at": "1000000",
            "bidding_deadline": "999000",
        })),
    )
    .await;
    let rfp_id = rfp["rfp_id"].as_str().unwrap().to_string();
    let (_, bid) = send(
        &app,
        "POST",
        &format!("/rfp/{rfp_id}/bid"),
        Some(json!({
            "bidder_agent_id": "provider-1",
            "bid_price_usdc": "5.00",
            "estimated_delivery_time_ms": 1000,
            "confidence_score": 0.9,
            "proposal": null,
            "expires_at": "4102444800",
        })),
    )
    .await;
    let bid_id = bid["bid_id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/rfp/{rfp_id}/select"),
        Some(json!({ "bid_id": bid_id, "selector_agent_id": "impostor" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
