//! Rating entity (spec section 3, "Rating").

use serde::{Deserialize, Serialize};

use crate::timestamp::UnixTimestamp;

/// A post-delivery rating of the rated agent by the rater, scoped to one
/// `Assignment`.
///
/// Invariant: at most one rating per `(rater_agent_id, assignment_id)`
/// pair (spec section 4.4, `submit_rating`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rating_id: String,
    pub assignment_id: String,
    pub rater_agent_id: String,
    pub rated_agent_id: String,
    pub score: f64,
    pub comment: Option<String>,
    pub created_at: UnixTimestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatingRequest {
    pub rater_agent_id: String,
    pub score: f64,
    pub comment: Option<String>,
}

impl Rating {
    pub fn is_valid_score(score: f64) -> bool {
        (1.0..=5.0).contains(&score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stars_is_rejected() {
        assert!(!Rating::is_valid_score(0.0));
        assert!(Rating::is_valid_score(1.0));
        assert!(Rating::is_valid_score(5.0));
        assert!(!Rating::is_valid_score(5.1));
    }
}
