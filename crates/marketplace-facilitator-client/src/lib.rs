//! Facilitator Client capability (spec section 4.2, C2).
//!
//! A thin RPC wrapper over a remote facilitator's `/supported`, `/verify`,
//! and `/settle` endpoints, modeled on the teacher's
//! `x402-axum::facilitator_client::FacilitatorClient`.

pub mod wire;

use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

pub use wire::{
    PaymentPayload, SettleRequest, SettleResponse, SupportedResponse, VerifyRequest,
    VerifyResponse,
};

/// Spec section 4.2: "Timeouts: verify 5 s, settle 30 s."
const VERIFY_TIMEOUT: Duration = Duration::from_secs(5);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum FacilitatorClientError {
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
    #[error("failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        context: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// A client for a remote x402 facilitator. Cheap to clone: the underlying
/// `reqwest::Client` shares a connection pool.
#[derive(Clone, Debug)]
pub struct FacilitatorClient {
    base_url: Url,
    verify_url: Url,
    settle_url: Url,
    supported_url: Url,
    client: Client,
}

impl FacilitatorClient {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn try_new(base_url: Url) -> Result<Self, FacilitatorClientError> {
        let verify_url = base_url
            .join("verify")
            .map_err(|e| FacilitatorClientError::UrlParse {
                context: "constructing /verify URL",
                source: e,
            })?;
        let settle_url = base_url
            .join("settle")
            .map_err(|e| FacilitatorClientError::UrlParse {
                context: "constructing /settle URL",
                source: e,
            })?;
        let supported_url =
            base_url
                .join("supported")
                .map_err(|e| FacilitatorClientError::UrlParse {
                    context: "constructing /supported URL",
                    source: e,
                })?;
        Ok(Self {
            client: Client::new(),
            base_url,
            verify_url,
            settle_url,
            supported_url,
        })
    }

    #[tracing::instrument(skip(self, request), err)]
    pub async fn verify(
        &self,
        request: &VerifyRequest,
    ) -> Result<VerifyResponse, FacilitatorClientError> {
        self.post_json(&self.verify_url, "POST /verify", request, VERIFY_TIMEOUT)
            .await
    }

    #[tracing::instrument(skip(self, request), err)]
    pub async fn settle(
        &self,
        request: &SettleRequest,
    ) -> Result<SettleResponse, FacilitatorClientError> {
        self.post_json(&self.settle_url, "POST /settle", request, SETTLE_TIMEOUT)
            .await
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn supported(&self) -> Result<SupportedResponse, FacilitatorClientError> {
        let response = self
            .client
            .get(self.supported_url.clone())
            .send()
            .await
            .map_err(|e| FacilitatorClientError::Http {
                context: "GET /supported",
                source: e,
            })?;
        Self::parse_response(response, "GET /supported").await
    }

    async fn post_json<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        payload: &T,
        timeout: Duration,
    ) -> Result<R, FacilitatorClientError>
    where
        T: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(url.clone())
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| FacilitatorClientError::Http { context, source: e })?;
        Self::parse_response(response, context).await
    }

    async fn parse_response<R>(
        response: reqwest::Response,
        context: &'static str,
    ) -> Result<R, FacilitatorClientError>
    where
        R: serde::de::DeserializeOwned,
    {
        if response.status() == StatusCode::OK {
            response
                .json::<R>()
                .await
                .map_err(|e| FacilitatorClientError::JsonDeserialization { context, source: e })
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| FacilitatorClientError::ResponseBodyRead { context, source: e })?;
            Err(FacilitatorClientError::HttpStatus {
                context,
                status,
                body,
            })
        }
    }
}

impl TryFrom<&str> for FacilitatorClient {
    type Error = FacilitatorClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut normalized = value.trim_end_matches('/').to_string();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|e| FacilitatorClientError::UrlParse {
            context: "parsing base url",
            source: e,
        })?;
        FacilitatorClient::try_new(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn verify_posts_payload_and_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(VerifyResponse {
                    is_valid: true,
                    message: None,
                }),
            )
            .mount(&server)
            .await;

        let client = FacilitatorClient::try_from(server.uri().as_str()).unwrap();
        let response = client
            .verify(&VerifyRequest {
                payment: PaymentPayload {
                    transaction: "dGVzdA==".into(),
                },
            })
            .await
            .unwrap();
        assert!(response.is_valid);
    }

    #[tokio::test]
    async fn settle_surfaces_non_200_as_http_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/settle"))
            .respond_with(ResponseTemplate::new(503).set_body_string("facilitator overloaded"))
            .mount(&server)
            .await;

        let client = FacilitatorClient::try_from(server.uri().as_str()).unwrap();
        let err = client
            .settle(&SettleRequest {
                payment: PaymentPayload {
                    transaction: "dGVzdA==".into(),
                },
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FacilitatorClientError::HttpStatus { .. }));
    }

    #[tokio::test]
    async fn supported_parses_discovery_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/supported"))
            .respond_with(ResponseTemplate::new(200).set_body_json(SupportedResponse {
                x402_version: 1,
                scheme: "exact".into(),
                network: "base-sepolia".into(),
                fee_payer_pubkey: "0xabc".into(),
                supported_tokens: vec!["USDC".into()],
            }))
            .mount(&server)
            .await;

        let client = FacilitatorClient::try_from(server.uri().as_str()).unwrap();
        let response = client.supported().await.unwrap();
        assert_eq!(response.scheme, "exact");
    }
}
