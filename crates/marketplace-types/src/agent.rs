//! Agent entity (spec section 3, "Agent").

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use url::Url;

use crate::money::MoneyAmount;
use crate::timestamp::UnixTimestamp;

/// The kind of agent. Open-ended by design (spec section 9's "Open question"
/// leaves room for a richer taxonomy); well-known values are exposed as
/// associated constants rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentType(pub String);

impl AgentType {
    pub const DATA_PROVIDER: &'static str = "data_provider";
    pub const CONSUMER: &'static str = "consumer";
    pub const EXECUTOR: &'static str = "executor";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentType {
    fn from(value: &str) -> Self {
        AgentType(value.to_string())
    }
}

/// A registered agent: consumer, provider, or executor.
///
/// Invariant: `successful_tasks <= total_tasks`; `reputation` is a derived
/// running mean of received ratings, recomputed by the store on each
/// `rate` call (spec section 4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: String,
    pub name: String,
    pub agent_type: AgentType,
    pub endpoint_url: Url,
    pub wallet_address: String,
    #[serde(default)]
    pub capabilities: HashSet<String>,
    #[serde(default)]
    pub pricing: HashMap<String, MoneyAmount>,
    #[serde(default)]
    pub reputation: f64,
    #[serde(default)]
    pub total_tasks: u64,
    #[serde(default)]
    pub successful_tasks: u64,
    pub created_at: UnixTimestamp,
}

impl Agent {
    pub fn is_valid(&self) -> bool {
        self.successful_tasks <= self.total_tasks && (0.0..=5.0).contains(&self.reputation)
    }

    pub fn price_for(&self, capability: &str) -> Option<MoneyAmount> {
        self.pricing.get(capability).copied()
    }
}

/// A `(agent_id, task_type)` subscription, registered so the provider
/// polling loop knows which RFPs to watch (spec section 3, "Subscription").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscription {
    pub agent_id: String,
    pub task_type: String,
}

/// Filter used by `GET /agents` (spec section 6).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentFilter {
    pub agent_type: Option<String>,
    pub capability: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_agent() -> Agent {
        Agent {
            agent_id: "agent-1".into(),
            name: "Test Agent".into(),
            agent_type: AgentType::from(AgentType::DATA_PROVIDER),
            endpoint_url: Url::parse("http://localhost:9000").unwrap(),
            wallet_address: "0xabc".into(),
            capabilities: HashSet::from(["price_data".to_string()]),
            pricing: HashMap::new(),
            reputation: 4.5,
            total_tasks: 10,
            successful_tasks: 9,
            created_at: UnixTimestamp(0),
        }
    }

    #[test]
    fn valid_agent_passes_invariant() {
        assert!(sample_agent().is_valid());
    }

    #[test]
    fn successful_exceeding_total_is_invalid() {
        let mut agent = sample_agent();
        agent.successful_tasks = agent.total_tasks + 1;
        assert!(!agent.is_valid());
    }
}
