//! x402 payment challenge and response wire types (spec section 6).

use serde::{Deserialize, Serialize};

use crate::timestamp::UnixTimestamp;

/// The JSON body of a `402 Payment Required` response, matching spec
/// section 6's challenge shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentChallenge {
    pub recipient: String,
    pub amount_human: String,
    pub amount_minor: u64,
    pub token_mint: String,
    pub network: String,
    pub facilitator_url: String,
    pub nonce: String,
    #[serde(with = "crate::timestamp::iso8601")]
    pub expires_at: UnixTimestamp,
}

impl PaymentChallenge {
    pub fn is_expired(&self, now: UnixTimestamp) -> bool {
        self.expires_at.has_passed(now)
    }
}

/// The payload carried in the `X-Payment-Response` header, proving
/// settlement back to the resource server (spec section 4.3, `RETRY`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentProof {
    pub signature: String,
    pub network: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_expired_challenge() {
        let challenge = PaymentChallenge {
            recipient: "0xabc".into(),
            amount_human: "1.00".into(),
            amount_minor: 1_000_000,
            token_mint: "USDC".into(),
            network: "base-sepolia".into(),
            facilitator_url: "http://localhost:8080".into(),
            nonce: "n1".into(),
            expires_at: UnixTimestamp(100),
        };
        assert!(challenge.is_expired(UnixTimestamp(200)));
        assert!(!challenge.is_expired(UnixTimestamp(50)));
    }
}
