//! Maps [`marketplace_ledger::LedgerError`] to HTTP status codes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use marketplace_ledger::LedgerError;
use serde_json::json;

pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(error: LedgerError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::RecipientAccountMissing(_) => StatusCode::BAD_REQUEST,
            LedgerError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
            LedgerError::RpcUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}
