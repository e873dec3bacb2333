//! Request/response bodies for the registry HTTP API (spec section 6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub task_type: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenRfpsQuery {
    pub task_types: Option<String>,
}

impl OpenRfpsQuery {
    pub fn task_type_list(&self) -> Vec<String> {
        self.task_types
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub bid_id: String,
    pub selector_agent_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub requester_agent_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryRequest {
    pub tx_signature: String,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rater_agent_id: String,
    pub assignment_id: String,
    pub stars: f64,
    pub review: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReputationResponse {
    pub mean: f64,
    pub count: usize,
    pub histogram: [usize; 5],
}
