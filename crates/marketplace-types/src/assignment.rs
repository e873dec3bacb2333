//! Assignment entity (spec section 3, "Assignment").

use serde::{Deserialize, Serialize};

use crate::money::MoneyAmount;
use crate::timestamp::UnixTimestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    PaymentSettled,
    Delivered,
    Failed,
}

/// Binds a selected `Bid` to its `Rfp`, tracking the single-settlement
/// payment and delivery lifecycle (spec section 4.7, step 5 onward).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_id: String,
    pub rfp_id: String,
    pub bid_id: String,
    pub provider_agent_id: String,
    pub requester_agent_id: String,
    pub agreed_price_usdc: MoneyAmount,
    pub created_at: UnixTimestamp,
    pub status: AssignmentStatus,
    pub settlement_signature: Option<String>,
}

impl Assignment {
    pub fn is_paid(&self) -> bool {
        matches!(
            self.status,
            AssignmentStatus::PaymentSettled | AssignmentStatus::Delivered
        )
    }
}
