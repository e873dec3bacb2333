//! HTTP endpoints over a single shared `MemoryLedger` (spec section 4.1,
//! C1): the provider and consumer processes each hold an
//! `RpcLedgerClient` pointed at this process instead of constructing their
//! own isolated ledger, so a settlement recorded by the consumer is visible
//! to the provider's `/deliver` confirmation check.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use marketplace_ledger::{MemoryLedger, TransactionBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

use crate::error::ApiError;

pub fn routes(ledger: Arc<MemoryLedger>) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/build_transfer", post(post_build_transfer))
        .route("/confirm_transfer", post(post_confirm_transfer))
        .route("/record_settlement", post(post_record_settlement))
        .with_state(ledger)
}

#[instrument(skip_all)]
async fn get_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct BuildTransferRequest {
    payer_pubkey: String,
    recipient_pubkey: String,
    token_mint: String,
    minor_units: u64,
    network: String,
}

#[instrument(skip(ledger))]
async fn post_build_transfer(
    State(ledger): State<Arc<MemoryLedger>>,
    Json(request): Json<BuildTransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tx = ledger
        .build_transfer(
            &request.payer_pubkey,
            &request.recipient_pubkey,
            &request.token_mint,
            request.minor_units,
            &request.network,
        )
        .await?;
    Ok(Json(tx))
}

#[derive(Debug, Deserialize)]
struct ConfirmTransferRequest {
    signature: String,
    expected_recipient: String,
    expected_minor_units: u64,
    expected_token_mint: String,
}

#[derive(Debug, Serialize)]
struct ConfirmTransferResponse {
    confirmed: bool,
}

#[instrument(skip(ledger))]
async fn post_confirm_transfer(
    State(ledger): State<Arc<MemoryLedger>>,
    Json(request): Json<ConfirmTransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let confirmed = ledger
        .confirm_transfer(
            &request.signature,
            &request.expected_recipient,
            request.expected_minor_units,
            &request.expected_token_mint,
        )
        .await?;
    Ok(Json(ConfirmTransferResponse { confirmed }))
}

#[derive(Debug, Deserialize)]
struct RecordSettlementRequest {
    signature: String,
    recipient: String,
    minor_units: u64,
    token_mint: String,
}

#[instrument(skip(ledger))]
async fn post_record_settlement(
    State(ledger): State<Arc<MemoryLedger>>,
    Json(request): Json<RecordSettlementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ledger
        .record_settlement(
            &request.signature,
            &request.recipient,
            request.minor_units,
            &request.token_mint,
        )
        .await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
