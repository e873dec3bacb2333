//! HTTP endpoints implemented by a provider process (spec section 4.6, C6).

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use marketplace_ledger::TransactionBuilder;
use marketplace_types::{PaymentChallenge, PaymentProof, UnixTimestamp};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::replay_cache::ReplayCache;
use crate::service::ServiceHandler;
use crate::wire::{DeliverRequest, DeliverResponse};

pub struct AppState<L> {
    pub ledger: L,
    pub replay_cache: ReplayCache,
    pub service_handler: Arc<dyn ServiceHandler>,
    pub wallet_address: String,
    pub price_minor: u64,
    pub token_mint: String,
    pub network: String,
    pub facilitator_url: String,
    pub challenge_ttl_secs: u64,
}

pub fn routes<L>(state: Arc<AppState<L>>) -> Router
where
    L: TransactionBuilder + Send + Sync + 'static,
    L::Error: Debug,
{
    Router::new()
        .route("/health", get(get_health))
        .route("/deliver", post(post_deliver))
        .with_state(state)
}

#[instrument(skip_all)]
async fn get_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[instrument(skip(state, headers, request))]
async fn post_deliver<L>(
    State(state): State<Arc<AppState<L>>>,
    headers: HeaderMap,
    Json(request): Json<DeliverRequest>,
) -> Result<impl IntoResponse, ProviderError>
where
    L: TransactionBuilder,
    L::Error: Debug,
{
    let now = UnixTimestamp::try_now()
        .map_err(|e| ProviderError::LedgerUnavailable(e.to_string()))?;

    let Some(header_value) = headers
        .get("X-Payment-Response")
        .and_then(|v| v.to_str().ok())
    else {
        let challenge = PaymentChallenge {
            recipient: state.wallet_address.clone(),
            amount_human: marketplace_types::MoneyAmount::from_minor_units(state.price_minor, 6)
                .to_string(),
            amount_minor: state.price_minor,
            token_mint: state.token_mint.clone(),
            network: state.network.clone(),
            facilitator_url: state.facilitator_url.clone(),
            nonce: Uuid::new_v4().to_string(),
            expires_at: now + state.challenge_ttl_secs,
        };
        return Ok((StatusCode::PAYMENT_REQUIRED, Json(challenge)).into_response());
    };

    let proof: PaymentProof = serde_json::from_str(header_value)
        .map_err(|e| ProviderError::MalformedProof(e.to_string()))?;

    if state.replay_cache.contains(&proof.signature, now) {
        return Err(ProviderError::ReplayedSignature);
    }

    let confirmed = state
        .ledger
        .confirm_transfer(
            &proof.signature,
            &state.wallet_address,
            state.price_minor,
            &state.token_mint,
        )
        .await
        .map_err(|e| ProviderError::LedgerUnavailable(format!("{e:?}")))?;
    if !confirmed {
        return Err(ProviderError::PaymentNotFoundOrInsufficient);
    }
    state.replay_cache.record(&proof.signature, now);

    let service_data = state
        .service_handler
        .handle(&request.task_type, &request.requirements);
    let response = DeliverResponse {
        service_data,
        payment_signature: proof.signature,
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}
