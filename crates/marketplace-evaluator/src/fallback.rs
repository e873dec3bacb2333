//! Deterministic weighted-score fallback (spec section 4.8).
//!
//! `score = w_price*(budget-price)/budget + w_rep*reputation/5
//!        + w_speed*max(0, 1 - latency/required)`
//!
//! Ties break by lowest price, then earliest bid timestamp.

use crate::{BidEvaluator, BidVerdict, EvaluatorError, RankResult, RateResult, ServiceResult};
use marketplace_types::{Bid, Rfp};
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub price: f64,
    pub reputation: f64,
    pub speed: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            price: 0.4,
            reputation: 0.35,
            speed: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicEvaluator {
    weights: Weights,
}

impl DeterministicEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: Weights) -> Self {
        Self { weights }
    }

    fn score(&self, rfp: &Rfp, bid: &Bid, reputation: f64) -> f64 {
        let budget = rfp.max_budget_usdc.0.to_f64().unwrap_or(0.0);
        let price = bid.bid_price_usdc.0.to_f64().unwrap_or(0.0);
        let price_term = if budget > 0.0 {
            ((budget - price) / budget).max(0.0)
        } else {
            0.0
        };
        let reputation_term = (reputation / 5.0).clamp(0.0, 1.0);

        // When the RFP states no delivery requirement, the speed criterion
        // cannot be evaluated and contributes nothing to the score (matches
        // spec section 8, scenario S2's worked arithmetic, which sums only
        // the price and reputation terms for an RFP with no stated
        // required_delivery_time_ms).
        let speed_term = match rfp.required_delivery_time_ms {
            None => 0.0,
            Some(required) if required == 0 => 0.0,
            Some(required) => {
                let latency = bid.estimated_delivery_time_ms.unwrap_or(required) as f64;
                (1.0 - latency / required as f64).max(0.0)
            }
        };

        self.weights.price * price_term
            + self.weights.reputation * reputation_term
            + self.weights.speed * speed_term
    }
}

impl BidEvaluator for DeterministicEvaluator {
    async fn rank(
        &self,
        rfp: &Rfp,
        bids: &[Bid],
        reputations: &HashMap<String, f64>,
    ) -> Result<RankResult, EvaluatorError> {
        if bids.is_empty() {
            return Err(EvaluatorError::NoBids);
        }

        let mut scored: Vec<(f64, &Bid)> = bids
            .iter()
            .map(|bid| {
                let reputation = reputations.get(&bid.bidder_agent_id).copied().unwrap_or(0.0);
                (self.score(rfp, bid, reputation), bid)
            })
            .collect();

        scored.sort_by(|(score_a, bid_a), (score_b, bid_b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| bid_a.bid_price_usdc.0.cmp(&bid_b.bid_price_usdc.0))
                .then_with(|| bid_a.created_at.cmp(&bid_b.created_at))
        });

        let (winner_score, winner) = scored[0];
        let verdicts = scored
            .iter()
            .map(|(score, bid)| BidVerdict {
                bid_id: bid.bid_id.clone(),
                accept: bid.bid_id == winner.bid_id,
                reason: format!("weighted score {score:.4}"),
            })
            .collect();

        Ok(RankResult {
            winner_bid_id: winner.bid_id.clone(),
            verdicts,
            confidence: winner_score.clamp(0.0, 1.0),
            analysis: format!(
                "deterministic fallback selected bid {} with score {:.4} across {} bids",
                winner.bid_id,
                winner_score,
                bids.len()
            ),
        })
    }

    async fn rate(
        &self,
        service_result: ServiceResult<'_>,
        latency_ms: u64,
        bid: &Bid,
    ) -> Result<RateResult, EvaluatorError> {
        if !service_result.success {
            return Ok(RateResult {
                stars: 1.0,
                review: "delivery reported failure".to_string(),
            });
        }

        let on_time = bid
            .estimated_delivery_time_ms
            .map(|estimate| latency_ms <= estimate)
            .unwrap_or(true);
        let stars = if on_time { 5.0 } else { 3.0 };
        Ok(RateResult {
            stars,
            review: format!(
                "delivered in {latency_ms}ms ({})",
                if on_time { "within estimate" } else { "slower than estimate" }
            ),
        })
    }
}
