//! Request/response bodies for the provider's `/deliver` route (spec
//! section 6).

use marketplace_types::{PaymentChallenge, PaymentProof};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies which RFP the consumer is paying to fulfil, so the provider
/// can recover the agreed price and echo the relevant requirements back
/// through [`crate::service::ServiceHandler`].
#[derive(Debug, Clone, Deserialize)]
pub struct DeliverRequest {
    pub rfp_id: String,
    pub task_type: String,
    #[serde(default)]
    pub requirements: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliverResponse {
    pub service_data: Value,
    pub payment_signature: String,
}

pub type Challenge = PaymentChallenge;
pub type Proof = PaymentProof;
