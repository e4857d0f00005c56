//! HTTP binding of the broker protocol.
//!
//! - `POST {base}/token` with a JSON [`TokenRequest`] body
//! - `GET {base}/sessions/{session_id}`
//!
//! Both answer with a JSON object tagged by `status`. The agent authenticates
//! to the broker with an optional workload bearer token.

use std::time::Duration;

use agentauth_retries::{RetryResult, RetryableError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::protocol::{IdentityBroker, SessionStatus, TokenRequest, TokenStatus};

/// Configuration for [`HttpBroker`].
#[derive(Debug, Clone)]
pub struct HttpBrokerConfig {
    /// Broker base URL.
    pub base_url: Url,
    /// Bearer token identifying this agent to the broker.
    pub workload_token: Option<String>,
    /// Callback URL attached to requests that lack one.
    pub callback_url: Option<Url>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpBrokerConfig {
    /// Create a config for a broker base URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            workload_token: None,
            callback_url: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the workload bearer token.
    #[must_use]
    pub fn with_workload_token(mut self, token: impl Into<String>) -> Self {
        self.workload_token = Some(token.into());
        self
    }

    /// Set the default callback URL.
    #[must_use]
    pub fn with_callback_url(mut self, url: Url) -> Self {
        self.callback_url = Some(url);
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Broker reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBroker {
    client: Client,
    config: HttpBrokerConfig,
}

impl HttpBroker {
    /// Create a broker client with a fresh reqwest client.
    pub fn new(config: HttpBrokerConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Create with a custom reqwest client.
    pub fn with_client(client: Client, config: HttpBrokerConfig) -> Self {
        Self { client, config }
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &HttpBrokerConfig {
        &self.config
    }

    fn endpoint(&self, segments: &[&str]) -> RetryResult<Url> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                RetryableError::Invalid(anyhow::anyhow!(
                    "broker base URL cannot be a base: {}",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.workload_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl IdentityBroker for HttpBroker {
    async fn request_token(&self, request: &TokenRequest) -> RetryResult<TokenStatus> {
        let url = self.endpoint(&["token"])?;
        debug!(url = %url, provider_id = %request.provider_id, "POST token request");

        let body = match (&request.callback_url, &self.config.callback_url) {
            (None, Some(default)) => request.clone().with_callback_url(default.clone()),
            _ => request.clone(),
        };

        let response = self
            .authorize(self.client.post(url))
            .json(&body)
            .send()
            .await?;

        decode(check_response(response).await?).await
    }

    async fn check_session(&self, session_id: &str) -> RetryResult<SessionStatus> {
        let url = self.endpoint(&["sessions", session_id])?;
        debug!(url = %url, session_id, "GET session status");

        let response = self.authorize(self.client.get(url)).send().await?;

        decode(check_response(response).await?).await
    }
}

/// Turn non-success statuses into [`RetryableError::Http`].
async fn check_response(response: Response) -> RetryResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = parse_retry_after(&response);
    let body = response.text().await.unwrap_or_default();
    Err(RetryableError::Http {
        status: status.as_u16(),
        body,
        retry_after,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> RetryResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| RetryableError::Invalid(err.into()))
}

/// Parse a Retry-After header given in seconds.
fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
