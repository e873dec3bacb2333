//! A [`TransactionBuilder`] implementation backed by a shared
//! `marketplace-ledger-rpc` process, modeled on
//! `marketplace_facilitator_client::FacilitatorClient`. Used by the
//! provider and consumer binaries so both processes observe the same
//! settled-signature state instead of each holding its own isolated
//! [`crate::MemoryLedger`] (spec section 4.1: "each service reads ...
//! ledger RPC URL").

use crate::{TransactionBuilder, UnsignedTransaction};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum RpcLedgerError {
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        context: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("HTTP error: {context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("ledger RPC returned {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
}

#[derive(Debug, Serialize)]
struct BuildTransferRequest<'a> {
    payer_pubkey: &'a str,
    recipient_pubkey: &'a str,
    token_mint: &'a str,
    minor_units: u64,
    network: &'a str,
}

#[derive(Debug, Serialize)]
struct ConfirmTransferRequest<'a> {
    signature: &'a str,
    expected_recipient: &'a str,
    expected_minor_units: u64,
    expected_token_mint: &'a str,
}

#[derive(Debug, Deserialize)]
struct ConfirmTransferResponse {
    confirmed: bool,
}

#[derive(Debug, Serialize)]
struct RecordSettlementRequest<'a> {
    signature: &'a str,
    recipient: &'a str,
    minor_units: u64,
    token_mint: &'a str,
}

/// A client for a shared `marketplace-ledger-rpc` process. Cheap to clone.
#[derive(Clone, Debug)]
pub struct RpcLedgerClient {
    build_transfer_url: Url,
    confirm_transfer_url: Url,
    record_settlement_url: Url,
    client: Client,
}

impl RpcLedgerClient {
    pub fn try_new(base_url: Url) -> Result<Self, RpcLedgerError> {
        let join = |segment: &str| {
            base_url
                .join(segment)
                .map_err(|e| RpcLedgerError::UrlParse {
                    context: "constructing ledger RPC URL",
                    source: e,
                })
        };
        Ok(Self {
            build_transfer_url: join("build_transfer")?,
            confirm_transfer_url: join("confirm_transfer")?,
            record_settlement_url: join("record_settlement")?,
            client: Client::new(),
        })
    }

    async fn post_json<T, R>(&self, url: &Url, context: &'static str, payload: &T) -> Result<R, RpcLedgerError>
    where
        T: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| RpcLedgerError::Http { context, source: e })?;
        let status = response.status();
        if status == StatusCode::OK {
            response
                .json::<R>()
                .await
                .map_err(|e| RpcLedgerError::Http { context, source: e })
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RpcLedgerError::HttpStatus { status, body })
        }
    }
}

impl TryFrom<&str> for RpcLedgerClient {
    type Error = RpcLedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut normalized = value.trim_end_matches('/').to_string();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|e| RpcLedgerError::UrlParse {
            context: "parsing ledger RPC base url",
            source: e,
        })?;
        RpcLedgerClient::try_new(url)
    }
}

impl TransactionBuilder for RpcLedgerClient {
    type Error = RpcLedgerError;

    async fn build_transfer(
        &self,
        payer_pubkey: &str,
        recipient_pubkey: &str,
        token_mint: &str,
        minor_units: u64,
        network: &str,
    ) -> Result<UnsignedTransaction, Self::Error> {
        self.post_json(
            &self.build_transfer_url,
            "POST /build_transfer",
            &BuildTransferRequest {
                payer_pubkey,
                recipient_pubkey,
                token_mint,
                minor_units,
                network,
            },
        )
        .await
    }

    async fn confirm_transfer(
        &self,
        signature: &str,
        expected_recipient: &str,
        expected_minor_units: u64,
        expected_token_mint: &str,
    ) -> Result<bool, Self::Error> {
        let response: ConfirmTransferResponse = self
            .post_json(
                &self.confirm_transfer_url,
                "POST /confirm_transfer",
                &ConfirmTransferRequest {
                    signature,
                    expected_recipient,
                    expected_minor_units,
                    expected_token_mint,
                },
            )
            .await?;
        Ok(response.confirmed)
    }

    async fn record_settlement(
        &self,
        signature: &str,
        recipient: &str,
        minor_units: u64,
        token_mint: &str,
    ) -> Result<(), Self::Error> {
        let _: serde_json::Value = self
            .post_json(
                &self.record_settlement_url,
                "POST /record_settlement",
                &RecordSettlementRequest {
                    signature,
                    recipient,
                    minor_units,
                    token_mint,
                },
            )
            .await?;
        Ok(())
    }
}
