//! RFP (Request for Proposal) entity (spec section 3, "RFP").

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::money::MoneyAmount;
use crate::timestamp::UnixTimestamp;

/// Lifecycle state of an RFP.
///
/// Transitions are monotone within `Open -> BiddingClosed -> Assigned ->
/// Completed`, with `Cancelled`/`Expired` as terminal sinks reachable from
/// `Open` or `BiddingClosed` (spec section 3, RFP invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RfpStatus {
    Open,
    BiddingClosed,
    Assigned,
    Completed,
    Cancelled,
    Expired,
}

impl RfpStatus {
    /// Whether a transition from `self` to `next` is permitted by the
    /// monotone lifecycle, including the terminal sinks.
    pub fn can_transition_to(self, next: RfpStatus) -> bool {
        use RfpStatus::*;
        match (self, next) {
            (Open, BiddingClosed | Assigned | Cancelled | Expired) => true,
            (BiddingClosed, Assigned | Cancelled | Expired) => true,
            (Assigned, Completed) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rfp {
    pub rfp_id: String,
    pub task_type: String,
    #[serde(default)]
    pub requirements: HashMap<String, Value>,
    pub max_budget_usdc: MoneyAmount,
    pub required_delivery_time_ms: Option<u64>,
    pub requester_agent_id: String,
    pub created_at: UnixTimestamp,
    pub expires_at: UnixTimestamp,
    pub status: RfpStatus,
    pub bidding_deadline: Option<UnixTimestamp>,
}

/// Fields accepted from a client creating a new RFP; the store fills in
/// `rfp_id`, `created_at`, and `status` (spec section 4.4, `create_rfp`).
#[derive(Debug, Clone, Deserialize)]
pub struct RfpRequest {
    pub task_type: String,
    #[serde(default)]
    pub requirements: HashMap<String, Value>,
    pub max_budget_usdc: MoneyAmount,
    pub required_delivery_time_ms: Option<u64>,
    pub requester_agent_id: String,
    pub expires_at: UnixTimestamp,
    pub bidding_deadline: Option<UnixTimestamp>,
}

impl Rfp {
    pub fn is_open_at(&self, now: UnixTimestamp) -> bool {
        self.status == RfpStatus::Open && self.expires_at > now
    }

    pub fn matches_task_type(&self, task_types: &[String]) -> bool {
        task_types.iter().any(|t| t == &self.task_type)
    }

    pub fn accepts_bids_at(&self, now: UnixTimestamp) -> bool {
        if self.status != RfpStatus::Open {
            return false;
        }
        match self.bidding_deadline {
            Some(deadline) => now <= deadline,
            None => now < self.expires_at,
        }
    }
}
