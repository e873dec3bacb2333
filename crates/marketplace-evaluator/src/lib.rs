//! Bid Evaluator capability (spec section 4.8, C8).
//!
//! The reference implementation backs both operations with an external
//! language model (see the `llm-evaluator` feature); this crate always
//! ships the deterministic fallback described by the spec, since it MUST
//! be used whenever the model capability fails or times out.

pub mod fallback;
#[cfg(feature = "llm-evaluator")]
pub mod llm;

use marketplace_types::{Bid, Rfp};
use std::collections::HashMap;
use std::future::Future;

pub use fallback::DeterministicEvaluator;

#[derive(Debug, Clone, PartialEq)]
pub struct BidVerdict {
    pub bid_id: String,
    pub accept: bool,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankResult {
    pub winner_bid_id: String,
    pub verdicts: Vec<BidVerdict>,
    pub confidence: f64,
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateResult {
    pub stars: f64,
    pub review: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ServiceResult<'a> {
    pub success: bool,
    pub service_data_summary: &'a str,
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    #[error("no bids to rank")]
    NoBids,
    #[error("evaluator capability unavailable: {0}")]
    Unavailable(String),
    #[error("evaluator capability timed out")]
    Timeout,
}

/// A capability with two pure operations (spec section 4.8). Implementors
/// may call out to an external model; callers are expected to fall back to
/// [`DeterministicEvaluator`] on [`EvaluatorError::Unavailable`] or
/// [`EvaluatorError::Timeout`].
pub trait BidEvaluator: Send + Sync {
    fn rank(
        &self,
        rfp: &Rfp,
        bids: &[Bid],
        reputations: &HashMap<String, f64>,
    ) -> impl Future<Output = Result<RankResult, EvaluatorError>> + Send;

    fn rate(
        &self,
        service_result: ServiceResult<'_>,
        latency_ms: u64,
        bid: &Bid,
    ) -> impl Future<Output = Result<RateResult, EvaluatorError>> + Send;
}

/// Runs `primary`, falling back to [`DeterministicEvaluator`] whenever the
/// primary capability is unavailable or times out (spec section 4.8:
/// "The fallback MUST be used whenever the model capability fails or times
/// out").
pub async fn rank_with_fallback<E: BidEvaluator>(
    primary: &E,
    fallback: &DeterministicEvaluator,
    rfp: &Rfp,
    bids: &[Bid],
    reputations: &HashMap<String, f64>,
) -> Result<RankResult, EvaluatorError> {
    match primary.rank(rfp, bids, reputations).await {
        Ok(result) => Ok(result),
        Err(EvaluatorError::Unavailable(reason)) => {
            tracing::warn!(reason, "evaluator unavailable, using deterministic fallback");
            fallback.rank(rfp, bids, reputations).await
        }
        Err(EvaluatorError::Timeout) => {
            tracing::warn!("evaluator timed out, using deterministic fallback");
            fallback.rank(rfp, bids, reputations).await
        }
        Err(other) => Err(other),
    }
}
