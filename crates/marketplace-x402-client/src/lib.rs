//! x402 Client capability (spec section 4.3, C3): the payment-gated request
//! state machine.
//!
//! ```text
//!  ISSUE --request--> PROVIDER
//!     |                   |
//!     |         200 OK    |  402 + challenge JSON
//!     |<------------------|
//!     |                   v
//!     |           PARSE_CHALLENGE
//!     |                   |
//!     |      amount>max   | amount<=max
//!     |<-BUDGET_EXCEEDED--|
//!     |                   v
//!     |            BUILD_TX (C1)
//!     |                   v
//!     |            SETTLE  (C2)
//!     |                   | fail
//!     |<--SETTLE_FAILED---|
//!     |                   | success -> signature
//!     |                   v
//!     |         RETRY with header
//!     |         X-Payment-Response: {signature, network}
//!     |                   |
//!     <----- 200 OK ------|
//!          or 402 again -> ABORT(PaymentRejected)
//! ```

use marketplace_facilitator_client::{
    FacilitatorClient, FacilitatorClientError, PaymentPayload, SettleRequest,
};
use marketplace_ledger::TransactionBuilder;
use marketplace_types::{MoneyAmount, PaymentChallenge, PaymentProof, UnixTimestamp};
use reqwest::{Client, Method, StatusCode};
use std::fmt::Debug;

#[derive(Debug, thiserror::Error)]
pub enum X402ClientError {
    #[error("transport error issuing {context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not parse 402 challenge body: {0}")]
    ParseChallenge(String),

    #[error("challenge amount {requested} exceeds max budget {max}")]
    BudgetExceeded { requested: String, max: String },

    #[error("transaction builder failed: {0}")]
    TransactionBuild(String),

    #[error("facilitator settlement failed: {0}")]
    SettleFailed(String),

    #[error(transparent)]
    FacilitatorTransport(#[from] FacilitatorClientError),

    /// Second 402 after presenting payment proof (spec section 4.3:
    /// "a second 402 after presenting proof is a terminal PaymentRejected").
    #[error("provider rejected payment after settlement")]
    PaymentRejected,

    /// Non-402 4xx/5xx on the retry. The payment has already settled, so
    /// the caller MUST still record `signature` (spec section 4.3).
    #[error("provider returned {status} on retry after payment settled")]
    ProviderError {
        status: StatusCode,
        body: String,
        signature: String,
    },

    /// A transport failure on the retry *after* the facilitator already
    /// settled. The payment happened regardless of whether the retry ever
    /// reaches the provider, so `signature` must not be dropped: retrying
    /// from the top would settle a second, real on-chain payment (spec
    /// section 4.3).
    #[error("transport error on retry after payment settled (signature {signature}): {source}")]
    PostSettlementTransport {
        signature: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The outcome of a successful payment-gated request.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub status: StatusCode,
    pub body: String,
    /// `Some` whenever a payment was settled during this request, whether
    /// the final retry succeeded or not.
    pub payment_signature: Option<String>,
}

/// Orchestrates the payment-gated request flow for one provider endpoint.
/// Generic over the ledger's [`TransactionBuilder`] so tests can substitute
/// `marketplace_ledger::MemoryLedger`.
pub struct X402Client<L> {
    http: Client,
    facilitator: FacilitatorClient,
    ledger: L,
    payer_pubkey: String,
}

impl<L> X402Client<L>
where
    L: TransactionBuilder,
    L::Error: Debug,
{
    pub fn new(http: Client, facilitator: FacilitatorClient, ledger: L, payer_pubkey: String) -> Self {
        Self {
            http,
            facilitator,
            ledger,
            payer_pubkey,
        }
    }

    /// Runs the full state machine for one `(method, url, body)` request,
    /// aborting with [`X402ClientError::BudgetExceeded`] if the provider's
    /// challenge asks for more than `max_amount`.
    #[tracing::instrument(skip(self, body), fields(%url), err)]
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
        max_amount: MoneyAmount,
    ) -> Result<DeliveryOutcome, X402ClientError> {
        let first = self.issue(method.clone(), url, &body).await?;
        if first.status() != StatusCode::PAYMENT_REQUIRED {
            return Self::into_outcome(first, None).await;
        }

        let challenge: PaymentChallenge = first
            .json()
            .await
            .map_err(|e| X402ClientError::ParseChallenge(e.to_string()))?;

        let max_minor = max_amount
            .to_minor_units(6)
            .ok_or_else(|| X402ClientError::ParseChallenge("max_amount out of range".into()))?;
        if challenge.amount_minor > max_minor {
            return Err(X402ClientError::BudgetExceeded {
                requested: challenge.amount_human.clone(),
                max: max_amount.to_string(),
            });
        }

        let unsigned_tx = self
            .ledger
            .build_transfer(
                &self.payer_pubkey,
                &challenge.recipient,
                &challenge.token_mint,
                challenge.amount_minor,
                &challenge.network,
            )
            .await
            .map_err(|e| X402ClientError::TransactionBuild(format!("{e:?}")))?;

        let settle_response = self
            .facilitator
            .settle(&SettleRequest {
                payment: PaymentPayload {
                    transaction: unsigned_tx.encoded,
                },
            })
            .await?;

        if !settle_response.success {
            return Err(X402ClientError::SettleFailed(
                settle_response
                    .error
                    .unwrap_or_else(|| "facilitator declined settlement".into()),
            ));
        }
        let signature = settle_response
            .transaction_signature
            .ok_or_else(|| X402ClientError::SettleFailed("missing transaction signature".into()))?;

        // Best-effort: makes the settlement visible to a shared ledger
        // (e.g. the provider's `confirm_transfer` check) ahead of the
        // retry. A failure here is not fatal to this request; the
        // provider's own confirmation check is what ultimately gates
        // `/deliver`.
        if let Err(e) = self
            .ledger
            .record_settlement(
                &signature,
                &challenge.recipient,
                challenge.amount_minor,
                &challenge.token_mint,
            )
            .await
        {
            tracing::warn!(signature, error = ?e, "failed to record settlement with ledger");
        }

        let proof = PaymentProof {
            signature: signature.clone(),
            network: challenge.network.clone(),
        };
        let retry = match self.issue_with_proof(method, url, &body, &proof).await {
            Ok(response) => response,
            Err(X402ClientError::Transport { source, .. }) => {
                return Err(X402ClientError::PostSettlementTransport { signature, source });
            }
            Err(e) => return Err(e),
        };

        match retry.status() {
            StatusCode::PAYMENT_REQUIRED => Err(X402ClientError::PaymentRejected),
            status if status.is_client_error() || status.is_server_error() => {
                let body_text = retry.text().await.unwrap_or_default();
                Err(X402ClientError::ProviderError {
                    status,
                    body: body_text,
                    signature,
                })
            }
            _ => Self::into_outcome(retry, Some(signature)).await,
        }
    }

    async fn issue(
        &self,
        method: Method,
        url: &str,
        body: &Option<serde_json::Value>,
    ) -> Result<reqwest::Response, X402ClientError> {
        let mut req = self.http.request(method, url);
        if let Some(b) = body {
            req = req.json(b);
        }
        req.send().await.map_err(|e| X402ClientError::Transport {
            context: "initial request",
            source: e,
        })
    }

    async fn issue_with_proof(
        &self,
        method: Method,
        url: &str,
        body: &Option<serde_json::Value>,
        proof: &PaymentProof,
    ) -> Result<reqwest::Response, X402ClientError> {
        let header_value = serde_json::to_string(proof)
            .map_err(|e| X402ClientError::ParseChallenge(e.to_string()))?;
        let mut req = self
            .http
            .request(method, url)
            .header("X-Payment-Response", header_value);
        if let Some(b) = body {
            req = req.json(b);
        }
        req.send().await.map_err(|e| X402ClientError::Transport {
            context: "retry with payment proof",
            source: e,
        })
    }

    async fn into_outcome(
        response: reqwest::Response,
        payment_signature: Option<String>,
    ) -> Result<DeliveryOutcome, X402ClientError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| X402ClientError::Transport {
            context: "reading response body",
            source: e,
        })?;
        Ok(DeliveryOutcome {
            status,
            body,
            payment_signature,
        })
    }
}

/// Checks whether a challenge has already expired, used before attempting
/// `BUILD_TX` so a stale challenge fails fast instead of settling against a
/// nonce the provider will no longer accept.
pub fn challenge_is_live(challenge: &PaymentChallenge, now: UnixTimestamp) -> bool {
    !challenge.is_expired(now)
}
