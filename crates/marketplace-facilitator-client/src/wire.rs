//! Wire types for the facilitator's three endpoints (spec section 4.2).

use serde::{Deserialize, Serialize};

/// The envelope shared by `/verify` and `/settle`: a base64-encoded unsigned
/// or partially-signed transaction produced by the Transaction Builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub transaction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub payment: PaymentPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleRequest {
    pub payment: PaymentPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleResponse {
    pub success: bool,
    #[serde(rename = "transactionSignature")]
    pub transaction_signature: Option<String>,
    pub network: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportedResponse {
    #[serde(rename = "x402Version")]
    pub x402_version: u32,
    pub scheme: String,
    pub network: String,
    #[serde(rename = "feePayer_pubkey")]
    pub fee_payer_pubkey: String,
    #[serde(rename = "supportedTokens")]
    pub supported_tokens: Vec<String>,
}
