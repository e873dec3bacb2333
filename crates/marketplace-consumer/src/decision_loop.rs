//! The consumer decision loop algorithm (spec section 4.7, C7).

use marketplace_evaluator::{BidEvaluator, EvaluatorError, ServiceResult};
use marketplace_ledger::TransactionBuilder;
use marketplace_types::{MoneyAmount, UnixTimestamp};
use marketplace_x402_client::{X402ClientError, X402Client};
use reqwest::Method;
use serde_json::json;
use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

use crate::config::Config;
use crate::outcome::ConsumerOutcome;
use crate::registry_client::{RegistryClient, build_rfp_request};

const BID_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Runs steps 1-8 of the decision loop to completion, returning the
/// discriminated result described by spec section 7.
pub async fn run<L, E>(config: &Config, x402: &X402Client<L>, evaluator: &E) -> ConsumerOutcome
where
    L: TransactionBuilder,
    L::Error: Debug,
    E: BidEvaluator,
{
    let registry = RegistryClient::new(&config.registry_url);

    // Step 1: construct and broadcast the RFP.
    let requirements: serde_json::Value =
        serde_json::from_str(&config.requirements).unwrap_or_else(|_| json!({}));
    let now = match UnixTimestamp::try_now() {
        Ok(now) => now,
        Err(e) => return ConsumerOutcome::failure("timeout", e.to_string()),
    };
    let rfp_request = build_rfp_request(
        config.task_type.clone(),
        requirements.clone(),
        config.max_budget_usdc,
        config.required_delivery_time_ms,
        config.agent_id.clone(),
        now,
        config.bidding_window_secs,
        config.rfp_lifetime_secs,
    );
    let bidding_deadline = rfp_request.bidding_deadline;
    let rfp = match registry.create_rfp(&rfp_request).await {
        Ok(rfp) => rfp,
        Err(e) => return ConsumerOutcome::failure("upstream_unavailable", e.to_string()),
    };
    tracing::info!(rfp_id = %rfp.rfp_id, "rfp broadcast");

    // Step 2: collect bids until the bidding deadline, polling for
    // observability (spec section 4.7, step 2).
    let deadline = bidding_deadline.unwrap_or(rfp.expires_at);
    let bids = loop {
        let bids = match registry.list_bids(&rfp.rfp_id).await {
            Ok(bids) => bids,
            Err(e) => return ConsumerOutcome::failure("upstream_unavailable", e.to_string()),
        };
        let now = match UnixTimestamp::try_now() {
            Ok(now) => now,
            Err(e) => return ConsumerOutcome::failure("timeout", e.to_string()),
        };
        if now >= deadline {
            break bids;
        }
        tokio::time::sleep(BID_POLL_INTERVAL).await;
    };

    // Step 3: abort if nobody bid.
    if bids.is_empty() {
        return ConsumerOutcome::failure("no_bids", "bidding window closed with zero bids");
    }

    // Reputation snapshot for the evaluator (spec section 4.8's `rank`
    // takes `reputations` as an argument, not a live lookup per bid).
    let mut reputations = HashMap::new();
    for bid in &bids {
        if reputations.contains_key(&bid.bidder_agent_id) {
            continue;
        }
        if let Ok(agent) = registry.get_agent(&bid.bidder_agent_id).await {
            reputations.insert(bid.bidder_agent_id.clone(), agent.reputation);
        }
    }

    // Step 4: rank and select a winner.
    let ranked = match evaluator.rank(&rfp, &bids, &reputations).await {
        Ok(ranked) => ranked,
        Err(EvaluatorError::NoBids) => {
            return ConsumerOutcome::failure("no_bids", "evaluator saw zero bids");
        }
        Err(e) => return ConsumerOutcome::failure("upstream_unavailable", e.to_string()),
    };
    let Some(winning_bid) = bids.iter().find(|b| b.bid_id == ranked.winner_bid_id) else {
        return ConsumerOutcome::failure("upstream_unavailable", "evaluator chose an unknown bid");
    };

    // Step 5: commit point. After this, a successful settlement must always
    // surface its signature even on subsequent failure (spec section 4.7).
    let assignment = match registry
        .select_winner(&rfp.rfp_id, &winning_bid.bid_id, &config.agent_id)
        .await
    {
        Ok(assignment) => assignment,
        Err(e) => return ConsumerOutcome::failure("upstream_unavailable", e.to_string()),
    };

    let provider = match registry.get_agent(&assignment.provider_agent_id).await {
        Ok(agent) => agent,
        Err(e) => return ConsumerOutcome::failure("upstream_unavailable", e.to_string()),
    };
    let deliver_url = match provider.endpoint_url.join("deliver") {
        Ok(url) => url,
        Err(e) => return ConsumerOutcome::failure("upstream_unavailable", e.to_string()),
    };
    let deliver_body = json!({
        "rfp_id": rfp.rfp_id,
        "task_type": rfp.task_type,
        "requirements": requirements,
    });

    // Step 6: pay and fetch, retrying transport failures up to the
    // configured attempt cap. A settlement is single-shot per attempt
    // because X402Client never retries past one successful settle.
    let max_amount: MoneyAmount = winning_bid.bid_price_usdc;
    let mut last_transport_error = None;
    for attempt in 1..=config.delivery_attempt_cap {
        let started = std::time::Instant::now();
        match x402
            .request(Method::POST, deliver_url.as_str(), Some(deliver_body.clone()), max_amount)
            .await
        {
            Ok(delivery) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let service_data: serde_json::Value =
                    serde_json::from_str(&delivery.body).unwrap_or(serde_json::Value::Null);
                return finish_delivery(
                    &registry,
                    &config.agent_id,
                    &assignment,
                    delivery.payment_signature,
                    service_data,
                    evaluator,
                    winning_bid,
                    latency_ms,
                )
                .await;
            }
            Err(X402ClientError::BudgetExceeded { requested, max }) => {
                return ConsumerOutcome::failure(
                    "budget_exceeded",
                    format!("challenge requested {requested}, budget is {max}"),
                );
            }
            Err(X402ClientError::SettleFailed(reason)) => {
                return ConsumerOutcome::failure("settlement_failed", reason);
            }
            Err(X402ClientError::PaymentRejected) => {
                return ConsumerOutcome::failure("payment_rejected", "provider rejected settled payment");
            }
            Err(X402ClientError::ProviderError { status, body, signature }) => {
                // Spec section 4.7: payment settled but delivery 5xx'd.
                return ConsumerOutcome::delivery_failed_after_payment(
                    signature,
                    format!("provider returned {status} on retry: {body}"),
                );
            }
            Err(X402ClientError::PostSettlementTransport { signature, source }) => {
                // The payment already settled; retrying from the top would
                // settle a second real payment, so this is terminal rather
                // than retryable (spec section 4.7).
                return ConsumerOutcome::delivery_failed_after_payment(signature, source.to_string());
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "delivery attempt failed, retrying");
                last_transport_error = Some(e.to_string());
            }
        }
    }
    ConsumerOutcome::failure(
        "upstream_unavailable",
        last_transport_error.unwrap_or_else(|| "delivery attempt cap exhausted".to_string()),
    )
}

async fn finish_delivery<E: BidEvaluator>(
    registry: &RegistryClient,
    consumer_agent_id: &str,
    assignment: &marketplace_types::Assignment,
    signature: Option<String>,
    service_data: serde_json::Value,
    evaluator: &E,
    winning_bid: &marketplace_types::Bid,
    latency_ms: u64,
) -> ConsumerOutcome {
    let Some(signature) = signature else {
        // The provider answered 200 without a payment step; spec section
        // 4.3 permits this for free resources, but C6's /deliver always
        // gates, so treat a missing signature here as an upstream defect.
        return ConsumerOutcome::failure("upstream_unavailable", "delivery succeeded without a payment signature");
    };

    // Step 7: record delivery. If this fails, the payment has already
    // settled, so the signature still surfaces.
    if let Err(e) = registry.record_delivery(&assignment.assignment_id, &signature).await {
        return ConsumerOutcome::delivery_failed_after_payment(signature, e.to_string());
    }

    // Step 8: rate and return.
    let rate_result = evaluator
        .rate(
            ServiceResult {
                success: true,
                service_data_summary: &service_data.to_string(),
            },
            latency_ms,
            winning_bid,
        )
        .await;
    if let Ok(rate_result) = rate_result {
        let _ = registry
            .rate(
                &assignment.provider_agent_id,
                consumer_agent_id,
                &assignment.assignment_id,
                rate_result.stars,
                Some(rate_result.review),
            )
            .await;
    }

    ConsumerOutcome::success(signature, service_data)
}
