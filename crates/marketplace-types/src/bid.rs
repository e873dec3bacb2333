//! Bid entity (spec section 3, "Bid").

use serde::{Deserialize, Serialize};

use crate::money::MoneyAmount;
use crate::timestamp::UnixTimestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Active,
    Withdrawn,
    Selected,
    Rejected,
}

/// A bidder's offer against an open RFP.
///
/// Invariant: at most one active (non-expired, non-rejected) bid per
/// `(rfp_id, bidder_agent_id)` pair, and `bid_price_usdc <=
/// rfp.max_budget_usdc` (spec section 3, "Bid"; section 4.4, `submit_bid`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub bid_id: String,
    pub rfp_id: String,
    pub bidder_agent_id: String,
    pub bid_price_usdc: MoneyAmount,
    pub estimated_delivery_time_ms: Option<u64>,
    /// The bidder's own confidence in its ability to deliver, in `[0,1]`.
    pub confidence_score: f64,
    /// The bidder's reputation at submission time, frozen so later
    /// drift in the live value cannot retroactively change a ranking
    /// decision (spec section 3: "`reputation_score` (snapshot)").
    pub reputation_score: f64,
    pub proposal: Option<String>,
    pub expires_at: UnixTimestamp,
    pub created_at: UnixTimestamp,
    pub status: BidStatus,
}

/// Fields accepted from a bidder submitting a bid. `reputation_score` is
/// not accepted here: the store stamps it from the bidder's own
/// registered `Agent` record, so a bidder cannot self-report it.
#[derive(Debug, Clone, Deserialize)]
pub struct BidRequest {
    pub bidder_agent_id: String,
    pub bid_price_usdc: MoneyAmount,
    pub estimated_delivery_time_ms: Option<u64>,
    pub confidence_score: f64,
    pub proposal: Option<String>,
    pub expires_at: UnixTimestamp,
}

impl Bid {
    pub fn exceeds_budget(&self, max_budget: MoneyAmount) -> bool {
        self.bid_price_usdc.0 > max_budget.0
    }

    pub fn is_confidence_score_valid(confidence_score: f64) -> bool {
        (0.0..=1.0).contains(&confidence_score)
    }

    pub fn is_active(&self, now: UnixTimestamp) -> bool {
        self.status == BidStatus::Active && !self.expires_at.has_passed(now)
    }
}
