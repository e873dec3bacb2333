//! Language-model-backed `BidEvaluator` (feature `llm-evaluator`, disabled by
//! default). The reference implementation named in the spec treats the
//! model as an external collaborator; this module is a thin HTTP client
//! over a chat-completion-style endpoint, returned structured verdicts via
//! a JSON response format, with no retry policy of its own — callers are
//! expected to use [`crate::rank_with_fallback`] for resilience.

use crate::{BidEvaluator, BidVerdict, EvaluatorError, RankResult, RateResult, ServiceResult};
use marketplace_types::{Bid, Rfp};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub struct LlmEvaluator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl LlmEvaluator {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RankCompletion {
    winner_bid_id: String,
    verdicts: Vec<VerdictCompletion>,
    confidence: f64,
    analysis: String,
}

#[derive(Debug, Deserialize)]
struct VerdictCompletion {
    bid_id: String,
    accept: bool,
    reason: String,
}

#[derive(Debug, Deserialize)]
struct RateCompletion {
    stars: f64,
    review: String,
}

impl BidEvaluator for LlmEvaluator {
    async fn rank(
        &self,
        rfp: &Rfp,
        bids: &[Bid],
        reputations: &HashMap<String, f64>,
    ) -> Result<RankResult, EvaluatorError> {
        if bids.is_empty() {
            return Err(EvaluatorError::NoBids);
        }
        let prompt = serde_json::json!({
            "rfp": rfp,
            "bids": bids,
            "reputations": reputations,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&prompt)
            .send()
            .await
            .map_err(|e| EvaluatorError::Unavailable(e.to_string()))?;

        if response.status().is_server_error() {
            return Err(EvaluatorError::Unavailable(format!(
                "model endpoint returned {}",
                response.status()
            )));
        }

        let completion: RankCompletion = response
            .json()
            .await
            .map_err(|e| EvaluatorError::Unavailable(e.to_string()))?;

        Ok(RankResult {
            winner_bid_id: completion.winner_bid_id,
            verdicts: completion
                .verdicts
                .into_iter()
                .map(|v| BidVerdict {
                    bid_id: v.bid_id,
                    accept: v.accept,
                    reason: v.reason,
                })
                .collect(),
            confidence: completion.confidence,
            analysis: completion.analysis,
        })
    }

    async fn rate(
        &self,
        service_result: ServiceResult<'_>,
        latency_ms: u64,
        bid: &Bid,
    ) -> Result<RateResult, EvaluatorError> {
        let prompt = serde_json::json!({
            "service_data_summary": service_result.service_data_summary,
            "success": service_result.success,
            "latency_ms": latency_ms,
            "bid": bid,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&prompt)
            .send()
            .await
            .map_err(|e| EvaluatorError::Unavailable(e.to_string()))?;

        let completion: RateCompletion = response
            .json()
            .await
            .map_err(|e| EvaluatorError::Unavailable(e.to_string()))?;

        Ok(RateResult {
            stars: completion.stars,
            review: completion.review,
        })
    }
}
