//! End-to-end exercise of the decision loop against mocked registry,
//! provider, and facilitator servers (spec section 8, scenario S1).

use marketplace_consumer::config::Config;
use marketplace_consumer::decision_loop;
use marketplace_evaluator::DeterministicEvaluator;
use marketplace_facilitator_client::{FacilitatorClient, SettleResponse};
use marketplace_ledger::MemoryLedger;
use marketplace_x402_client::X402Client;
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn base_config(registry_url: String, facilitator_url: String) -> Config {
    Config {
        registry_url,
        agent_id: "consumer-1".into(),
        wallet_address: "consumer-wallet".into(),
        task_type: "price_feed".into(),
        requirements: "{}".into(),
        max_budget_usdc: "10.00".parse().unwrap(),
        required_delivery_time_ms: Some(2000),
        bidding_window_secs: 0,
        rfp_lifetime_secs: 3600,
        token_mint: "USDC".into(),
        token_decimals: 6,
        network: "base-sepolia".into(),
        facilitator_url,
        ledger_rpc_url: "http://unused".into(),
        delivery_attempt_cap: 2,
    }
}

#[tokio::test]
async fn happy_path_pays_delivers_and_rates() {
    let registry = MockServer::start().await;
    let provider = MockServer::start().await;
    let facilitator = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rfp/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rfp_id": "rfp-1",
            "task_type": "price_feed",
            "requirements": {},
            "max_budget_usdc": "10.00",
            "required_delivery_time_ms": 2000,
            "requester_agent_id": "consumer-1",
            "created_at": "0",
            "expires_at": "3600",
            "status": "open",
            "bidding_deadline": "0",
        })))
        .mount(&registry)
        .await;

    Mock::given(method("GET"))
        .and(path("/rfp/rfp-1/bids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "bid_id": "bid-1",
            "rfp_id": "rfp-1",
            "bidder_agent_id": "provider-1",
            "bid_price_usdc": "5.00",
            "estimated_delivery_time_ms": 1000,
            "confidence_score": 0.9,
            "reputation_score": 4.8,
            "proposal": null,
            "expires_at": "4102444800",
            "created_at": "0",
            "status": "active",
        }])))
        .mount(&registry)
        .await;

    Mock::given(method("GET"))
        .and(path("/agents/provider-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "agent_id": "provider-1",
            "name": "Provider One",
            "agent_type": "data_provider",
            "endpoint_url": provider.uri(),
            "wallet_address": "provider-wallet",
            "capabilities": ["price_feed"],
            "pricing": {},
            "reputation": 4.8,
            "total_tasks": 3,
            "successful_tasks": 3,
            "created_at": "0",
        })))
        .mount(&registry)
        .await;

    Mock::given(method("POST"))
        .and(path("/rfp/rfp-1/select"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "assignment_id": "assignment-1",
            "rfp_id": "rfp-1",
            "bid_id": "bid-1",
            "provider_agent_id": "provider-1",
            "requester_agent_id": "consumer-1",
            "agreed_price_usdc": "5.00",
            "created_at": "0",
            "status": "pending",
            "settlement_signature": null,
        })))
        .mount(&registry)
        .await;

    Mock::given(method("POST"))
        .and(path("/assignments/assignment-1/delivery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "assignment_id": "assignment-1",
            "rfp_id": "rfp-1",
            "bid_id": "bid-1",
            "provider_agent_id": "provider-1",
            "requester_agent_id": "consumer-1",
            "agreed_price_usdc": "5.00",
            "created_at": "0",
            "status": "delivered",
            "settlement_signature": "sig-123",
        })))
        .mount(&registry)
        .await;

    Mock::given(method("POST"))
        .and(path("/agents/provider-1/rate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rating_id": "rating-1",
            "assignment_id": "assignment-1",
            "rater_agent_id": "consumer-1",
            "rated_agent_id": "provider-1",
            "score": 5.0,
            "comment": "delivered in 0ms (within estimate)",
            "created_at": "0",
        })))
        .mount(&registry)
        .await;

    Mock::given(method("POST"))
        .and(path("/deliver"))
        .and(wiremock::matchers::header_exists("x-payment-response"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "service_data": {"symbol": "SOL/USDC", "price": "172.50"},
            "payment_signature": "sig-123",
        })))
        .with_priority(1)
        .mount(&provider)
        .await;
    Mock::given(method("POST"))
        .and(path("/deliver"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "recipient": "provider-wallet",
            "amount_human": "5.00",
            "amount_minor": 5_000_000u64,
            "token_mint": "USDC",
            "network": "base-sepolia",
            "facilitator_url": facilitator.uri(),
            "nonce": "nonce-1",
            "expires_at": "9999-12-31T23:59:59Z",
        })))
        .with_priority(2)
        .mount(&provider)
        .await;

    Mock::given(method("POST"))
        .and(path("settle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(SettleResponse {
            success: true,
            transaction_signature: Some("sig-123".into()),
            network: "base-sepolia".into(),
            error: None,
        }))
        .mount(&facilitator)
        .await;

    let config = base_config(registry.uri(), facilitator.uri());
    let facilitator_client = FacilitatorClient::try_from(facilitator.uri().as_str()).unwrap();
    let x402 = X402Client::new(
        Client::new(),
        facilitator_client,
        MemoryLedger::new(),
        "consumer-wallet".into(),
    );
    let evaluator = DeterministicEvaluator::new();

    let outcome = decision_loop::run(&config, &x402, &evaluator).await;
    assert!(outcome.ok, "expected success, got {outcome:?}");
    assert_eq!(outcome.signature.as_deref(), Some("sig-123"));
}

#[tokio::test]
async fn zero_bids_aborts_with_no_bids() {
    let registry = MockServer::start().await;
    let facilitator = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rfp/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rfp_id": "rfp-2",
            "task_type": "price_feed",
            "requirements": {},
            "max_budget_usdc": "10.00",
            "required_delivery_time_ms": 2000,
            "requester_agent_id": "consumer-1",
            "created_at": "0",
            "expires_at": "3600",
            "status": "open",
            "bidding_deadline": "0",
        })))
        .mount(&registry)
        .await;
    Mock::given(method("GET"))
        .and(path("/rfp/rfp-2/bids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Array(vec![])))
        .mount(&registry)
        .await;

    let config = base_config(registry.uri(), facilitator.uri());
    let facilitator_client = FacilitatorClient::try_from(facilitator.uri().as_str()).unwrap();
    let x402 = X402Client::new(
        Client::new(),
        facilitator_client,
        MemoryLedger::new(),
        "consumer-wallet".into(),
    );
    let evaluator = DeterministicEvaluator::new();

    let outcome = decision_loop::run(&config, &x402, &evaluator).await;
    assert!(!outcome.ok);
    assert_eq!(outcome.error_kind.as_deref(), Some("no_bids"));
}
