//! The discriminated result surfaced to whatever invokes the decision loop
//! (spec section 7: "the consumer returns a discriminated result
//! `{ok, error_kind, signature?, data?, reason}`").

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct ConsumerOutcome {
    pub ok: bool,
    pub error_kind: Option<String>,
    pub signature: Option<String>,
    pub data: Option<Value>,
    pub reason: Option<String>,
}

impl ConsumerOutcome {
    pub fn success(signature: String, data: Value) -> Self {
        Self {
            ok: true,
            error_kind: None,
            signature: Some(signature),
            data: Some(data),
            reason: None,
        }
    }

    pub fn failure(error_kind: &str, reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_kind: Some(error_kind.to_string()),
            signature: None,
            data: None,
            reason: Some(reason.into()),
        }
    }

    /// Payment settled but delivery failed afterward (spec section 4.7's
    /// partial-failure rule): the signature MUST still surface.
    pub fn delivery_failed_after_payment(signature: String, reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_kind: Some("delivery_failed_after_payment".to_string()),
            signature: Some(signature),
            data: None,
            reason: Some(reason.into()),
        }
    }
}
