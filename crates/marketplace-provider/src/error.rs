//! Error taxonomy for the provider process.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no price configured for capability {0}")]
    NoPrice(String),

    #[error("payment proof could not be parsed: {0}")]
    MalformedProof(String),

    #[error("payment not found or insufficient")]
    PaymentNotFoundOrInsufficient,

    #[error("payment signature already used")]
    ReplayedSignature,

    #[error("ledger confirmation failed: {0}")]
    LedgerUnavailable(String),
}

impl IntoResponse for ProviderError {
    fn into_response(self) -> Response {
        match self {
            ProviderError::PaymentNotFoundOrInsufficient | ProviderError::ReplayedSignature => {
                (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(json!({ "error": "payment_not_found_or_insufficient" })),
                )
                    .into_response()
            }
            ProviderError::MalformedProof(ref reason) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "malformed_payment_proof", "message": reason })),
            )
                .into_response(),
            ProviderError::NoPrice(ref capability) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "no_price", "message": format!("no price for {capability}") })),
            )
                .into_response(),
            ProviderError::LedgerUnavailable(ref reason) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "upstream_unavailable", "message": reason })),
            )
                .into_response(),
        }
    }
}
