//! reqwest-backed client for the user and opportunity services, reached
//! through the platform's API gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use uuid::Uuid;

use super::PlatformGateway;
use super::model::{OpportunityDigest, OpportunityKind, OpportunityListing, RegistrationRequest};
use super::retry::RetryPolicy;
use crate::config::{GatewayConfig, SERVICE_NAME};
use crate::error::GatewayError;

/// Header naming the calling component.
pub const SERVICE_NAME_HEADER: &str = "X-Service-Name";
/// Header carrying a per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";
/// Header carrying the USSD session id.
pub const SESSION_ID_HEADER: &str = "X-Session-Id";

/// How many opportunities are requested per lookup.
const OPPORTUNITY_FETCH_LIMIT: usize = 50;

/// HTTP implementation of [`PlatformGateway`].
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    read_timeout: Duration,
    retry: RetryPolicy,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()
            .map_err(|e| GatewayError::Transport {
                operation: "build_client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            read_timeout: config.read_timeout,
            retry: RetryPolicy::from(config),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A request carrying the correlation headers and optional bearer token.
    fn request(
        &self,
        method: Method,
        url: &str,
        session_id: &str,
        request_id: &str,
    ) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(SERVICE_NAME_HEADER, SERVICE_NAME)
            .header(REQUEST_ID_HEADER, request_id)
            .header(SESSION_ID_HEADER, session_id);

        match &self.api_key {
            Some(key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }

    /// Send with retries. Responses whose status is a success or listed in
    /// `accepted` are returned; anything else becomes an error.
    async fn send<F>(
        &self,
        operation: &str,
        accepted: &[StatusCode],
        build: F,
    ) -> Result<Response, GatewayError>
    where
        F: Fn() -> RequestBuilder,
    {
        let timeout = self.read_timeout;
        self.retry
            .run(operation, |attempt| {
                let request = build();
                async move {
                    let response = request
                        .send()
                        .await
                        .map_err(|e| GatewayError::from_reqwest(operation, e, timeout))?;
                    let status = response.status();
                    debug!(operation, attempt, status = status.as_u16(), "Gateway response");

                    if status.is_success() || accepted.contains(&status) {
                        Ok(response)
                    } else {
                        Err(GatewayError::from_status(operation, status))
                    }
                }
            })
            .await
    }
}

#[async_trait]
impl PlatformGateway for HttpGateway {
    async fn register_user(
        &self,
        request: &RegistrationRequest,
        session_id: &str,
    ) -> Result<(), GatewayError> {
        let url = self.url("/api/v1/users/register/ussd");
        let request_id = Uuid::new_v4().to_string();

        self.send("register_user", &[], || {
            self.request(Method::POST, &url, session_id, &request_id)
                .json(request)
        })
        .await?;
        Ok(())
    }

    async fn is_registered(&self, phone: &str, session_id: &str) -> Result<bool, GatewayError> {
        let url = self.url(&format!("/api/v1/users/phone/{phone}"));
        let request_id = Uuid::new_v4().to_string();

        let response = self
            .send("is_registered", &[StatusCode::NOT_FOUND], || {
                self.request(Method::GET, &url, session_id, &request_id)
            })
            .await?;

        Ok(response.status() != StatusCode::NOT_FOUND)
    }

    async fn fetch_opportunities(
        &self,
        kind: OpportunityKind,
        session_id: &str,
    ) -> Result<Vec<OpportunityDigest>, GatewayError> {
        let url = self.url("/api/v1/opportunities");
        let request_id = Uuid::new_v4().to_string();
        let limit = OPPORTUNITY_FETCH_LIMIT.to_string();

        let response = self
            .send("fetch_opportunities", &[], || {
                self.request(Method::GET, &url, session_id, &request_id)
                    .query(&[
                        ("type", kind.as_query()),
                        ("status", "OPEN"),
                        ("size", limit.as_str()),
                    ])
            })
            .await?;

        let listing: OpportunityListing =
            response.json().await.map_err(|e| GatewayError::Decode {
                operation: "fetch_opportunities".to_string(),
                reason: e.to_string(),
            })?;

        Ok(listing.into_vec())
    }
}
