//! Thin HTTP client over the registry's RFP lifecycle endpoints (spec
//! section 6), used by the decision loop.

use marketplace_types::{Agent, Assignment, Bid, MoneyAmount, Rating, Rfp, RfpRequest, UnixTimestamp};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum RegistryClientError {
    #[error("registry transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("registry returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Clone)]
pub struct RegistryClient {
    http: Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RegistryClientError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(RegistryClientError::Status { status, body })
        }
    }

    pub async fn create_rfp(&self, request: &RfpRequest) -> Result<Rfp, RegistryClientError> {
        let response = self
            .http
            .post(format!("{}/rfp/create", self.base_url))
            .json(request)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn list_bids(&self, rfp_id: &str) -> Result<Vec<Bid>, RegistryClientError> {
        let response = self
            .http
            .get(format!("{}/rfp/{}/bids", self.base_url, rfp_id))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent, RegistryClientError> {
        let response = self
            .http
            .get(format!("{}/agents/{}", self.base_url, agent_id))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn select_winner(
        &self,
        rfp_id: &str,
        bid_id: &str,
        selector_agent_id: &str,
    ) -> Result<Assignment, RegistryClientError> {
        let response = self
            .http
            .post(format!("{}/rfp/{}/select", self.base_url, rfp_id))
            .json(&json!({ "bid_id": bid_id, "selector_agent_id": selector_agent_id }))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn record_delivery(
        &self,
        assignment_id: &str,
        tx_signature: &str,
    ) -> Result<Assignment, RegistryClientError> {
        let response = self
            .http
            .post(format!("{}/assignments/{}/delivery", self.base_url, assignment_id))
            .json(&json!({ "tx_signature": tx_signature }))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn rate(
        &self,
        provider_agent_id: &str,
        rater_agent_id: &str,
        assignment_id: &str,
        stars: f64,
        review: Option<String>,
    ) -> Result<Rating, RegistryClientError> {
        let response = self
            .http
            .post(format!("{}/agents/{}/rate", self.base_url, provider_agent_id))
            .json(&json!({
                "rater_agent_id": rater_agent_id,
                "assignment_id": assignment_id,
                "stars": stars,
                "review": review,
            }))
            .send()
            .await?;
        Self::parse(response).await
    }
}

/// Builds the RFP creation request for step 1 of the decision loop.
pub fn build_rfp_request(
    task_type: String,
    requirements: serde_json::Value,
    max_budget_usdc: MoneyAmount,
    required_delivery_time_ms: Option<u64>,
    requester_agent_id: String,
    now: UnixTimestamp,
    bidding_window_secs: u64,
    rfp_lifetime_secs: u64,
) -> RfpRequest {
    RfpRequest {
        task_type,
        requirements: requirements
            .as_object()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .collect(),
        max_budget_usdc,
        required_delivery_time_ms,
        requester_agent_id,
        expires_at: now + rfp_lifetime_secs,
        bidding_deadline: Some(now + bidding_window_secs),
    }
}
