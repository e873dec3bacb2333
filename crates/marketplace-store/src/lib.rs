//! RFP Store capability (spec section 4.4, C4).
//!
//! Concurrency-safe in-memory marketplace state. Mutations of a single RFP
//! (and its bids/assignment) are serialized via a per-RFP `tokio::sync::Mutex`;
//! rating updates are serialized per-rated-agent so the reputation running
//! mean is race-free (spec section 5, "Ordering guarantees").

mod reputation;
mod sweeper;

pub use sweeper::spawn_expiry_sweeper;

use dashmap::DashMap;
use marketplace_types::{
    Agent, AgentFilter, Assignment, AssignmentStatus, Bid, BidRequest, BidStatus,
    MarketplaceError, Rating, Rfp, RfpRequest, RfpStatus, Subscription, UnixTimestamp,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub use reputation::ReputationSummary;

/// A marketplace-wide in-memory store. Cheap to clone (wraps an `Arc`),
/// safe to share across the registry's request handlers.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    agents: DashMap<String, Agent>,
    subscriptions: DashMap<String, HashSet<String>>,
    rfps: DashMap<String, Rfp>,
    bids: DashMap<String, Vec<Bid>>,
    assignments: DashMap<String, Assignment>,
    ratings: DashMap<String, Vec<Rating>>,
    rfp_locks: DashMap<String, Arc<Mutex<()>>>,
    reputation_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Inner {
    fn rfp_lock(&self, rfp_id: &str) -> Arc<Mutex<()>> {
        self.rfp_locks
            .entry(rfp_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn reputation_lock(&self, agent_id: &str) -> Arc<Mutex<()>> {
        self.reputation_locks
            .entry(agent_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Agents ----------------------------------------------------

    /// Idempotent: re-registering the same `agent_id` updates the existing
    /// record (spec section 4.5).
    pub fn register_agent(&self, agent: Agent) -> Result<Agent, MarketplaceError> {
        if !agent.is_valid() {
            return Err(MarketplaceError::Validation(format!(
                "agent {} fails invariant checks",
                agent.agent_id
            )));
        }
        self.inner
            .agents
            .insert(agent.agent_id.clone(), agent.clone());
        Ok(agent)
    }

    pub fn unregister_agent(&self, agent_id: &str) -> Result<(), MarketplaceError> {
        self.inner
            .agents
            .remove(agent_id)
            .map(|_| ())
            .ok_or_else(|| MarketplaceError::NotFound(format!("agent {agent_id}")))
    }

    pub fn get_agent(&self, agent_id: &str) -> Option<Agent> {
        self.inner.agents.get(agent_id).map(|a| a.clone())
    }

    pub fn list_agents(&self, filter: &AgentFilter) -> Vec<Agent> {
        self.inner
            .agents
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|agent| {
                filter
                    .agent_type
                    .as_ref()
                    .map(|t| agent.agent_type.as_str() == t)
                    .unwrap_or(true)
            })
            .filter(|agent| {
                filter
                    .capability
                    .as_ref()
                    .map(|c| agent.capabilities.contains(c))
                    .unwrap_or(true)
            })
            .collect()
    }

    pub fn subscribe(&self, agent_id: &str, task_type: &str) {
        self.inner
            .subscriptions
            .entry(agent_id.to_string())
            .or_default()
            .insert(task_type.to_string());
    }

    pub fn unsubscribe(&self, agent_id: &str, task_type: &str) {
        if let Some(mut set) = self.inner.subscriptions.get_mut(agent_id) {
            set.remove(task_type);
        }
    }

    pub fn subscriptions_for(&self, agent_id: &str) -> Vec<Subscription> {
        self.inner
            .subscriptions
            .get(agent_id)
            .map(|set| {
                set.iter()
                    .map(|task_type| Subscription {
                        agent_id: agent_id.to_string(),
                        task_type: task_type.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    // ---- RFPs --------------------------------------------------------

    pub fn create_rfp(&self, request: RfpRequest, now: UnixTimestamp) -> Result<Rfp, MarketplaceError> {
        let rfp = Rfp {
            rfp_id: Uuid::new_v4().to_string(),
            task_type: request.task_type,
            requirements: request.requirements,
            max_budget_usdc: request.max_budget_usdc,
            required_delivery_time_ms: request.required_delivery_time_ms,
            requester_agent_id: request.requester_agent_id,
            created_at: now,
            expires_at: request.expires_at,
            status: RfpStatus::Open,
            bidding_deadline: request.bidding_deadline,
        };
        self.inner.rfps.insert(rfp.rfp_id.clone(), rfp.clone());
        Ok(rfp)
    }

    pub fn get_rfp(&self, rfp_id: &str) -> Option<Rfp> {
        self.inner.rfps.get(rfp_id).map(|r| r.clone())
    }

    pub fn list_open_rfps(&self, task_types: &[String], now: UnixTimestamp) -> Vec<Rfp> {
        self.inner
            .rfps
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|rfp| rfp.is_open_at(now))
            .filter(|rfp| task_types.is_empty() || rfp.matches_task_type(task_types))
            .collect()
    }

    /// Replace semantics: a bidder's prior active bid on this RFP is
    /// superseded, not concatenated (spec section 4.4).
    pub async fn submit_bid(
        &self,
        rfp_id: &str,
        caller_agent_id: &str,
        request: BidRequest,
        now: UnixTimestamp,
    ) -> Result<Bid, MarketplaceError> {
        if caller_agent_id != request.bidder_agent_id {
            return Err(MarketplaceError::Unauthorized(
                "bidder_agent_id must equal the calling agent".into(),
            ));
        }
        let lock = self.inner.rfp_lock(rfp_id);
        let _guard = lock.lock().await;

        let rfp = self
            .inner
            .rfps
            .get(rfp_id)
            .map(|r| r.clone())
            .ok_or_else(|| MarketplaceError::NotFound(format!("rfp {rfp_id}")))?;
        if !rfp.accepts_bids_at(now) {
            return Err(MarketplaceError::Conflict(format!(
                "rfp {rfp_id} is not open for bidding"
            )));
        }
        if request.bid_price_usdc.0 > rfp.max_budget_usdc.0 {
            return Err(MarketplaceError::Validation(format!(
                "bid price {} exceeds max budget {}",
                request.bid_price_usdc, rfp.max_budget_usdc
            )));
        }
        if !Bid::is_confidence_score_valid(request.confidence_score) {
            return Err(MarketplaceError::Validation(format!(
                "confidence_score {} out of range [0,1]",
                request.confidence_score
            )));
        }
        if request.expires_at <= now {
            return Err(MarketplaceError::Validation(
                "bid expires_at must be after now".into(),
            ));
        }

        // Snapshot the bidder's reputation at submission time rather than
        // trusting a client-supplied value (spec section 3: "reputation_score
        // (snapshot)").
        let reputation_score = self
            .inner
            .agents
            .get(&request.bidder_agent_id)
            .map(|a| a.reputation)
            .unwrap_or(0.0);

        let bid = Bid {
            bid_id: Uuid::new_v4().to_string(),
            rfp_id: rfp_id.to_string(),
            bidder_agent_id: request.bidder_agent_id,
            bid_price_usdc: request.bid_price_usdc,
            estimated_delivery_time_ms: request.estimated_delivery_time_ms,
            confidence_score: request.confidence_score,
            reputation_score,
            proposal: request.proposal,
            expires_at: request.expires_at,
            created_at: now,
            status: BidStatus::Active,
        };

        let mut bids = self.inner.bids.entry(rfp_id.to_string()).or_default();
        for existing in bids.iter_mut() {
            if existing.bidder_agent_id == bid.bidder_agent_id && existing.is_active(now) {
                existing.status = BidStatus::Withdrawn;
            }
        }
        bids.push(bid.clone());
        Ok(bid)
    }

    pub fn list_bids(&self, rfp_id: &str, now: UnixTimestamp) -> Result<Vec<Bid>, MarketplaceError> {
        if !self.inner.rfps.contains_key(rfp_id) {
            return Err(MarketplaceError::NotFound(format!("rfp {rfp_id}")));
        }
        Ok(self
            .inner
            .bids
            .get(rfp_id)
            .map(|bids| bids.iter().filter(|b| b.is_active(now)).cloned().collect())
            .unwrap_or_default())
    }

    pub async fn select_winner(
        &self,
        rfp_id: &str,
        caller_agent_id: &str,
        bid_id: &str,
        now: UnixTimestamp,
    ) -> Result<Assignment, MarketplaceError> {
        let lock = self.inner.rfp_lock(rfp_id);
        let _guard = lock.lock().await;

        let mut rfp = self
            .inner
            .rfps
            .get(rfp_id)
            .map(|r| r.clone())
            .ok_or_else(|| MarketplaceError::NotFound(format!("rfp {rfp_id}")))?;
        if rfp.requester_agent_id != caller_agent_id {
            return Err(MarketplaceError::Unauthorized(
                "only the RFP's requester may select a winner".into(),
            ));
        }
        if rfp.status == RfpStatus::Assigned || rfp.status == RfpStatus::Completed {
            return Err(MarketplaceError::Conflict(format!(
                "rfp {rfp_id} already has an assignment"
            )));
        }
        if !matches!(rfp.status, RfpStatus::Open | RfpStatus::BiddingClosed) {
            return Err(MarketplaceError::Conflict(format!(
                "rfp {rfp_id} is in terminal state {:?}",
                rfp.status
            )));
        }

        let bid = self
            .inner
            .bids
            .get(rfp_id)
            .and_then(|bids| bids.iter().find(|b| b.bid_id == bid_id).cloned())
            .ok_or_else(|| MarketplaceError::NotFound(format!("bid {bid_id}")))?;
        if !bid.is_active(now) {
            return Err(MarketplaceError::Conflict(format!("bid {bid_id} is not active")));
        }

        let assignment = Assignment {
            assignment_id: Uuid::new_v4().to_string(),
            rfp_id: rfp_id.to_string(),
            bid_id: bid.bid_id.clone(),
            provider_agent_id: bid.bidder_agent_id.clone(),
            requester_agent_id: rfp.requester_agent_id.clone(),
            agreed_price_usdc: bid.bid_price_usdc,
            created_at: now,
            status: AssignmentStatus::Pending,
            settlement_signature: None,
        };

        rfp.status = RfpStatus::Assigned;
        self.inner.rfps.insert(rfp_id.to_string(), rfp);
        self.inner
            .assignments
            .insert(assignment.assignment_id.clone(), assignment.clone());
        Ok(assignment)
    }

    pub fn get_assignment(&self, assignment_id: &str) -> Option<Assignment> {
        self.inner.assignments.get(assignment_id).map(|a| a.clone())
    }

    pub async fn record_delivery(
        &self,
        assignment_id: &str,
        tx_signature: &str,
    ) -> Result<Assignment, MarketplaceError> {
        let mut assignment = self
            .inner
            .assignments
            .get(assignment_id)
            .map(|a| a.clone())
            .ok_or_else(|| MarketplaceError::NotFound(format!("assignment {assignment_id}")))?;

        let lock = self.inner.rfp_lock(&assignment.rfp_id);
        let _guard = lock.lock().await;

        assignment.status = AssignmentStatus::Delivered;
        assignment.settlement_signature = Some(tx_signature.to_string());
        self.inner
            .assignments
            .insert(assignment_id.to_string(), assignment.clone());

        if let Some(mut rfp) = self.inner.rfps.get_mut(&assignment.rfp_id) {
            rfp.status = RfpStatus::Completed;
        }

        let rep_lock = self.inner.reputation_lock(&assignment.provider_agent_id);
        let _rep_guard = rep_lock.lock().await;
        if let Some(mut agent) = self.inner.agents.get_mut(&assignment.provider_agent_id) {
            agent.total_tasks += 1;
        }
        Ok(assignment)
    }

    pub async fn rate(
        &self,
        assignment_id: &str,
        rater_agent_id: &str,
        score: f64,
        comment: Option<String>,
        now: UnixTimestamp,
    ) -> Result<Rating, MarketplaceError> {
        if !Rating::is_valid_score(score) {
            return Err(MarketplaceError::Validation(format!(
                "score {score} out of range [0,5]"
            )));
        }
        let assignment = self
            .inner
            .assignments
            .get(assignment_id)
            .map(|a| a.clone())
            .ok_or_else(|| MarketplaceError::NotFound(format!("assignment {assignment_id}")))?;
        if assignment.requester_agent_id != rater_agent_id {
            return Err(MarketplaceError::Unauthorized(
                "only the assignment's requester may submit a rating".into(),
            ));
        }

        let rated_agent_id = assignment.provider_agent_id.clone();
        let lock = self.inner.reputation_lock(&rated_agent_id);
        let _guard = lock.lock().await;

        let mut ratings_for_assignment =
            self.inner.ratings.entry(assignment_id.to_string()).or_default();
        if ratings_for_assignment
            .iter()
            .any(|r| r.rater_agent_id == rater_agent_id)
        {
            return Err(MarketplaceError::Conflict(format!(
                "agent {rater_agent_id} already rated assignment {assignment_id}"
            )));
        }

        let rating = Rating {
            rating_id: Uuid::new_v4().to_string(),
            assignment_id: assignment_id.to_string(),
            rater_agent_id: rater_agent_id.to_string(),
            rated_agent_id: rated_agent_id.clone(),
            score,
            comment,
            created_at: now,
        };
        ratings_for_assignment.push(rating.clone());
        drop(ratings_for_assignment);

        let scores: Vec<f64> = self
            .inner
            .ratings
            .iter()
            .flat_map(|entry| entry.value().clone())
            .filter(|r| r.rated_agent_id == rated_agent_id)
            .map(|r| r.score)
            .collect();
        let summary = reputation::summarize(0.0, &scores);
        if let Some(mut agent) = self.inner.agents.get_mut(&rated_agent_id) {
            agent.reputation = summary.mean;
            if score >= 3.0 {
                agent.successful_tasks += 1;
            }
        }
        Ok(rating)
    }

    pub fn reputation_summary(&self, agent_id: &str) -> Result<ReputationSummary, MarketplaceError> {
        let agent = self
            .get_agent(agent_id)
            .ok_or_else(|| MarketplaceError::NotFound(format!("agent {agent_id}")))?;
        let scores: Vec<f64> = self
            .inner
            .ratings
            .iter()
            .flat_map(|entry| entry.value().clone())
            .filter(|rating| rating.rated_agent_id == agent_id)
            .map(|rating| rating.score)
            .collect();
        Ok(reputation::summarize(agent.reputation, &scores))
    }

    /// Transitions every RFP whose `expires_at` has passed from `open`/
    /// `bidding_closed` to `expired` (spec section 4.4, sweeper). Returns
    /// the number of RFPs transitioned.
    pub fn sweep_expired(&self, now: UnixTimestamp) -> usize {
        let mut swept = 0;
        for mut entry in self.inner.rfps.iter_mut() {
            let rfp = entry.value_mut();
            if matches!(rfp.status, RfpStatus::Open | RfpStatus::BiddingClosed)
                && rfp.expires_at.has_passed(now)
            {
                rfp.status = RfpStatus::Expired;
                swept += 1;
            }
        }
        swept
    }

    pub async fn cancel_rfp(
        &self,
        rfp_id: &str,
        caller_agent_id: &str,
    ) -> Result<Rfp, MarketplaceError> {
        let lock = self.inner.rfp_lock(rfp_id);
        let _guard = lock.lock().await;

        let mut rfp = self
            .inner
            .rfps
            .get(rfp_id)
            .map(|r| r.clone())
            .ok_or_else(|| MarketplaceError::NotFound(format!("rfp {rfp_id}")))?;
        if rfp.requester_agent_id != caller_agent_id {
            return Err(MarketplaceError::Unauthorized(
                "only the RFP's requester may cancel it".into(),
            ));
        }
        if !matches!(rfp.status, RfpStatus::Open | RfpStatus::BiddingClosed) {
            return Err(MarketplaceError::Conflict(format!(
                "rfp {rfp_id} cannot be cancelled from state {:?}",
                rfp.status
            )));
        }
        rfp.status = RfpStatus::Cancelled;
        self.inner.rfps.insert(rfp_id.to_string(), rfp.clone());
        Ok(rfp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_types::{AgentType, MoneyAmount};
    use std::collections::HashMap;
    use url::Url;

    fn sample_agent(id: &str) -> Agent {
        Agent {
            agent_id: id.into(),
            name: "Test".into(),
            agent_type: AgentType::from(AgentType::DATA_PROVIDER),
            endpoint_url: Url::parse("http://localhost:9000").unwrap(),
            wallet_address: "0xabc".into(),
            capabilities: Default::default(),
            pricing: Default::default(),
            reputation: 0.0,
            total_tasks: 0,
            successful_tasks: 0,
            created_at: UnixTimestamp(0),
        }
    }

    fn sample_rfp_request() -> RfpRequest {
        RfpRequest {
            task_type: "price_feed".into(),
            requirements: HashMap::new(),
            max_budget_usdc: MoneyAmount::parse("10.00").unwrap(),
            required_delivery_time_ms: Some(2000),
            requester_agent_id: "consumer-1".into(),
            expires_at: UnixTimestamp(1_000_000),
            bidding_deadline: Some(UnixTimestamp(999_000)),
        }
    }

    #[tokio::test]
    async fn full_happy_path_lifecycle() {
        let store = Store::new();
        store.register_agent(sample_agent("consumer-1")).unwrap();
        store.register_agent(sample_agent("provider-1")).unwrap();

        let rfp = store
            .create_rfp(sample_rfp_request(), UnixTimestamp(0))
            .unwrap();
        assert_eq!(rfp.status, RfpStatus::Open);

        let bid = store
            .submit_bid(
                &rfp.rfp_id,
                "provider-1",
                BidRequest {
                    bidder_agent_id: "provider-1".into(),
                    bid_price_usdc: MoneyAmount::parse("5.00").unwrap(),
                    estimated_delivery_time_ms: Some(1000),
                    confidence_score: 0.9,
                    proposal: None,
                    expires_at: UnixTimestamp(1_000_000),
                },
                UnixTimestamp(1),
            )
            .await
            .unwrap();

        let assignment = store
            .select_winner(&rfp.rfp_id, "consumer-1", &bid.bid_id, UnixTimestamp(2))
            .await
            .unwrap();
        assert_eq!(
            store.get_rfp(&rfp.rfp_id).unwrap().status,
            RfpStatus::Assigned
        );

        store
            .record_delivery(&assignment.assignment_id, "sig-1")
            .await
            .unwrap();
        assert_eq!(
            store.get_rfp(&rfp.rfp_id).unwrap().status,
            RfpStatus::Completed
        );

        store
            .rate(
                &assignment.assignment_id,
                "consumer-1",
                4.5,
                Some("great".into()),
                UnixTimestamp(3),
            )
            .await
            .unwrap();
        let summary = store.reputation_summary("provider-1").unwrap();
        assert_eq!(summary.count, 1);
        assert!((summary.mean - 4.5).abs() < f64::EPSILON);

        let provider = store.get_agent("provider-1").unwrap();
        assert_eq!(provider.total_tasks, 1);
        assert_eq!(provider.successful_tasks, 1);
    }

    #[tokio::test]
    async fn rebid_supersedes_prior_active_bid() {
        let store = Store::new();
        store.register_agent(sample_agent("consumer-1")).unwrap();
        store.register_agent(sample_agent("provider-1")).unwrap();
        let rfp = store
            .create_rfp(sample_rfp_request(), UnixTimestamp(0))
            .unwrap();

        store
            .submit_bid(
                &rfp.rfp_id,
                "provider-1",
                BidRequest {
                    bidder_agent_id: "provider-1".into(),
                    bid_price_usdc: MoneyAmount::parse("8.00").unwrap(),
                    estimated_delivery_time_ms: None,
                    confidence_score: 0.9,
                    proposal: None,
                    expires_at: UnixTimestamp(1_000_000),
                },
                UnixTimestamp(1),
            )
            .await
            .unwrap();
        store
            .submit_bid(
                &rfp.rfp_id,
                "provider-1",
                BidRequest {
                    bidder_agent_id: "provider-1".into(),
                    bid_price_usdc: MoneyAmount::parse("6.00").unwrap(),
                    estimated_delivery_time_ms: None,
                    confidence_score: 0.9,
                    proposal: None,
                    expires_at: UnixTimestamp(1_000_000),
                },
                UnixTimestamp(2),
            )
            .await
            .unwrap();

        let bids = store.list_bids(&rfp.rfp_id, UnixTimestamp(2)).unwrap();
        assert_eq!(bids.len(), 1);
        assert_eq!(bids[0].bid_price_usdc.to_string(), "6.00");
    }

    #[tokio::test]
    async fn rejects_bid_exceeding_budget() {
        let store = Store::new();
        store.register_agent(sample_agent("consumer-1")).unwrap();
        let rfp = store
            .create_rfp(sample_rfp_request(), UnixTimestamp(0))
            .unwrap();
        let err = store
            .submit_bid(
                &rfp.rfp_id,
                "provider-1",
                BidRequest {
                    bidder_agent_id: "provider-1".into(),
                    bid_price_usdc: MoneyAmount::parse("99.00").unwrap(),
                    estimated_delivery_time_ms: None,
                    confidence_score: 0.9,
                    proposal: None,
                    expires_at: UnixTimestamp(1_000_000),
                },
                UnixTimestamp(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::Validation(_)));
    }

    #[tokio::test]
    async fn select_winner_requires_requester_identity() {
        let store = Store::new();
        store.register_agent(sample_agent("consumer-1")).unwrap();
        let rfp = store
            .create_rfp(sample_rfp_request(), UnixTimestamp(0))
            .unwrap();
        let bid = store
            .submit_bid(
                &rfp.rfp_id,
                "provider-1",
                BidRequest {
                    bidder_agent_id: "provider-1".into(),
                    bid_price_usdc: MoneyAmount::parse("5.00").unwrap(),
                    estimated_delivery_time_ms: None,
                    confidence_score: 0.9,
                    proposal: None,
                    expires_at: UnixTimestamp(1_000_000),
                },
                UnixTimestamp(1),
            )
            .await
            .unwrap();
        let err = store
            .select_winner(&rfp.rfp_id, "someone-else", &bid.bid_id, UnixTimestamp(2))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn select_is_rejected_once_already_assigned() {
        let store = Store::new();
        store.register_agent(sample_agent("consumer-1")).unwrap();
        let rfp = store
            .create_rfp(sample_rfp_request(), UnixTimestamp(0))
            .unwrap();
        let bid = store
            .submit_bid(
                &rfp.rfp_id,
                "provider-1",
                BidRequest {
                    bidder_agent_id: "provider-1".into(),
                    bid_price_usdc: MoneyAmount::parse("5.00").unwrap(),
                    estimated_delivery_time_ms: None,
                    confidence_score: 0.9,
                    proposal: None,
                    expires_at: UnixTimestamp(1_000_000),
                },
                UnixTimestamp(1),
            )
            .await
            .unwrap();
        store
            .select_winner(&rfp.rfp_id, "consumer-1", &bid.bid_id, UnixTimestamp(2))
            .await
            .unwrap();
        let err = store
            .select_winner(&rfp.rfp_id, "consumer-1", &bid.bid_id, UnixTimestamp(3))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::Conflict(_)));
    }

    #[tokio::test]
    async fn sweeper_expires_stale_rfps() {
        let store = Store::new();
        store.register_agent(sample_agent("consumer-1")).unwrap();
        let mut request = sample_rfp_request();
        request.expires_at = UnixTimestamp(10);
        store.create_rfp(request, UnixTimestamp(0)).unwrap();

        let swept = store.sweep_expired(UnixTimestamp(20));
        assert_eq!(swept, 1);
    }

    #[tokio::test]
    async fn duplicate_rating_is_rejected() {
        let store = Store::new();
        store.register_agent(sample_agent("consumer-1")).unwrap();
        let rfp = store
            .create_rfp(sample_rfp_request(), UnixTimestamp(0))
            .unwrap();
        let bid = store
            .submit_bid(
                &rfp.rfp_id,
                "provider-1",
                BidRequest {
                    bidder_agent_id: "provider-1".into(),
                    bid_price_usdc: MoneyAmount::parse("5.00").unwrap(),
                    estimated_delivery_time_ms: None,
                    confidence_score: 0.9,
                    proposal: None,
                    expires_at: UnixTimestamp(1_000_000),
                },
                UnixTimestamp(1),
            )
            .await
            .unwrap();
        let assignment = store
            .select_winner(&rfp.rfp_id, "consumer-1", &bid.bid_id, UnixTimestamp(2))
            .await
            .unwrap();
        store
            .rate(&assignment.assignment_id, "consumer-1", 5.0, None, UnixTimestamp(3))
            .await
            .unwrap();
        let err = store
            .rate(&assignment.assignment_id, "consumer-1", 4.0, None, UnixTimestamp(4))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::Conflict(_)));
    }
}
