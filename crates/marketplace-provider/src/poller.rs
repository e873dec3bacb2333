//! RFP polling loop (spec section 4.6, "Polling loop").
//!
//! At a configurable cadence, calls `GET /rfp/open?task_types=…` on the
//! registry. For each not-yet-seen RFP id, decides whether to bid and at
//! what price, then `POST /rfp/{id}/bid`s. A failed bid submission is
//! retried once after a short backoff; a second failure is logged and the
//! RFP is dropped (it remains marked "seen" so it is not retried forever).

use marketplace_types::UnixTimestamp;
use reqwest::Client;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const BID_RETRY_BACKOFF: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct PollerConfig {
    pub registry_url: String,
    pub agent_id: String,
    pub task_type: String,
    pub price_usdc: marketplace_types::MoneyAmount,
    pub estimated_delivery_ms: u64,
    pub confidence_score: f64,
    pub bid_validity_secs: u64,
    pub poll_interval: Duration,
}

pub async fn run(config: PollerConfig, cancellation_token: CancellationToken) {
    let client = match Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to build poller HTTP client");
            return;
        }
    };
    let mut seen = HashSet::new();
    let mut interval = tokio::time::interval(config.poll_interval);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                tracing::info!("poller shutting down");
                return;
            }
            _ = interval.tick() => {
                poll_once(&client, &config, &mut seen).await;
            }
        }
    }
}

async fn poll_once(client: &Client, config: &PollerConfig, seen: &mut HashSet<String>) {
    let url = format!(
        "{}/rfp/open?task_types={}",
        config.registry_url.trim_end_matches('/'),
        config.task_type
    );
    let rfps: Vec<Value> = match client.get(&url).send().await {
        Ok(response) => match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse open RFPs response");
                return;
            }
        },
        Err(e) => {
            // Spec section 7: provider polling swallows transient
            // UpstreamUnavailable and continues on the next tick.
            tracing::warn!(error = %e, "registry unreachable this tick");
            return;
        }
    };

    for rfp in rfps {
        let Some(rfp_id) = rfp.get("rfp_id").and_then(Value::as_str) else {
            continue;
        };
        if seen.contains(rfp_id) {
            continue;
        }
        seen.insert(rfp_id.to_string());
        submit_bid_with_retry(client, config, rfp_id).await;
    }
}

async fn submit_bid_with_retry(client: &Client, config: &PollerConfig, rfp_id: &str) {
    let expires_at = match UnixTimestamp::try_now() {
        Ok(now) => now + config.bid_validity_secs,
        Err(e) => {
            tracing::warn!(rfp_id, error = %e, "clock unavailable, dropping bid");
            return;
        }
    };
    let body = json!({
        "bidder_agent_id": config.agent_id,
        "bid_price_usdc": config.price_usdc.to_string(),
        "estimated_delivery_time_ms": config.estimated_delivery_ms,
        "confidence_score": config.confidence_score,
        "proposal": null,
        "expires_at": expires_at.to_string(),
    });
    let url = format!(
        "{}/rfp/{}/bid",
        config.registry_url.trim_end_matches('/'),
        rfp_id
    );

    for attempt in 0..2 {
        match client.post(&url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(rfp_id, "bid submitted");
                return;
            }
            Ok(response) => {
                tracing::warn!(rfp_id, status = %response.status(), attempt, "bid rejected");
            }
            Err(e) => {
                tracing::warn!(rfp_id, error = %e, attempt, "bid submission failed");
            }
        }
        if attempt == 0 {
            tokio::time::sleep(BID_RETRY_BACKOFF).await;
        }
    }
    tracing::warn!(rfp_id, "dropping bid after retry exhausted");
}
