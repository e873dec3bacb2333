//! The pluggable `ServiceHandler` capability (spec section 1: "concrete
//! data-provider business logic (abstracted behind `ServiceHandler`)").
//!
//! Concrete providers supply their own implementation; this crate ships a
//! deterministic default that echoes a summary of the request so the
//! payment-gated flow is exercisable end-to-end without a real data feed.

use serde_json::{Value, json};

pub trait ServiceHandler: Send + Sync {
    /// Produces the `service_data` body returned alongside `payment_signature`
    /// once payment has been confirmed (spec section 4.6, step 3).
    fn handle(&self, task_type: &str, requirements: &Value) -> Value;
}

#[derive(Debug, Clone, Default)]
pub struct EchoServiceHandler;

impl ServiceHandler for EchoServiceHandler {
    fn handle(&self, task_type: &str, requirements: &Value) -> Value {
        json!({
            "task_type": task_type,
            "requirements_echo": requirements,
            "note": "reference ServiceHandler: replace with real business logic",
        })
    }
}
