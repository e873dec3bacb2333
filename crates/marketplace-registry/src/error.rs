//! Maps [`MarketplaceError`] to HTTP status codes (spec section 7).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use marketplace_types::MarketplaceError;
use serde_json::json;

pub struct ApiError(pub MarketplaceError);

impl From<MarketplaceError> for ApiError {
    fn from(error: MarketplaceError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MarketplaceError::Validation(_) => StatusCode::BAD_REQUEST,
            MarketplaceError::Conflict(_) => StatusCode::CONFLICT,
            MarketplaceError::NotFound(_) => StatusCode::NOT_FOUND,
            MarketplaceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            MarketplaceError::BudgetExceeded(_) => StatusCode::PAYMENT_REQUIRED,
            MarketplaceError::NoBids => StatusCode::NOT_FOUND,
            MarketplaceError::SettlementFailed(_) => StatusCode::BAD_GATEWAY,
            MarketplaceError::PaymentRejected => StatusCode::PAYMENT_REQUIRED,
            MarketplaceError::DeliveryFailedAfterPayment(_) => StatusCode::BAD_GATEWAY,
            MarketplaceError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            MarketplaceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        };
        let body = Json(json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
