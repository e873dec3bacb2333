//! Shared error taxonomy (spec section 7, "Error Handling Design").
//!
//! This enum is the common currency between the store, the HTTP layer, and
//! the consumer decision loop: each variant maps to one HTTP status in the
//! registry and one terminal outcome in the consumer (spec section 4.7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),

    #[error("no bids received")]
    NoBids,

    #[error("settlement failed: {0}")]
    SettlementFailed(String),

    #[error("payment rejected by provider")]
    PaymentRejected,

    #[error("delivery failed after payment was settled: {0}")]
    DeliveryFailedAfterPayment(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("operation timed out: {0}")]
    Timeout(String),
}

impl MarketplaceError {
    /// Stable machine-readable tag for logging and JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict_error",
            Self::NotFound(_) => "not_found_error",
            Self::Unauthorized(_) => "unauthorized_error",
            Self::BudgetExceeded(_) => "budget_exceeded",
            Self::NoBids => "no_bids",
            Self::SettlementFailed(_) => "settlement_failed",
            Self::PaymentRejected => "payment_rejected",
            Self::DeliveryFailedAfterPayment(_) => "delivery_failed_after_payment",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::Timeout(_) => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_stable_for_logging() {
        assert_eq!(MarketplaceError::NoBids.kind(), "no_bids");
        assert_eq!(
            MarketplaceError::Validation("bad".into()).kind(),
            "validation_error"
        );
    }
}
