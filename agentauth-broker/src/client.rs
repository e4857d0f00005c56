//! Token request client.
//!
//! [`TokenRequestClient`] issues the single "get or start" call against the
//! broker and translates the answer into either a ready [`TokenResult`] or a
//! [`PendingAuth`] descriptor. Transient failures are retried under the
//! client's [`RetryConfig`] before surfacing as
//! [`AuthError::BrokerUnavailable`].

use std::sync::Arc;

use agentauth_core::{AuthError, PendingAuth, TokenResult};
use agentauth_retries::{with_retry, RetryConfig, RetryableError};
use tracing::{debug, info};

use crate::protocol::{IdentityBroker, TokenRequest, TokenStatus};

/// Outcome of a token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    /// The broker had a valid grant.
    Ready(TokenResult),
    /// Consent is still required.
    Pending(PendingAuth),
}

/// Client for the broker's `requestToken` operation.
#[derive(Clone)]
pub struct TokenRequestClient {
    broker: Arc<dyn IdentityBroker>,
    retry: RetryConfig,
}

impl TokenRequestClient {
    /// Create a client with the default broker retry config.
    pub fn new(broker: Arc<dyn IdentityBroker>) -> Self {
        Self {
            broker,
            retry: RetryConfig::default(),
        }
    }

    /// Set the retry config used for transient failures.
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The underlying broker.
    pub fn broker(&self) -> &Arc<dyn IdentityBroker> {
        &self.broker
    }

    /// Request a token, or learn that consent is pending.
    pub async fn request(&self, request: &TokenRequest) -> Result<TokenOutcome, AuthError> {
        debug!(
            provider_id = %request.provider_id,
            scopes = %request.scopes,
            "Requesting token from broker"
        );

        let status = with_retry(&self.retry, || self.broker.request_token(request))
            .await
            .map_err(|err| map_request_error(&request.provider_id, err))?;

        match status {
            TokenStatus::Ready { access_token } => {
                if access_token.is_empty() {
                    return Err(AuthError::protocol("READY response carried an empty token"));
                }
                info!(provider_id = %request.provider_id, "Broker returned cached grant");
                Ok(TokenOutcome::Ready(TokenResult::new(access_token)))
            }
            TokenStatus::Pending {
                authorization_url,
                session_id,
            } => {
                if session_id.is_empty() {
                    return Err(AuthError::protocol("PENDING response carried no session id"));
                }
                debug!(
                    provider_id = %request.provider_id,
                    session_id = %session_id,
                    "Broker reports consent pending"
                );
                Ok(TokenOutcome::Pending(PendingAuth::new(
                    session_id,
                    authorization_url,
                )))
            }
        }
    }
}

impl std::fmt::Debug for TokenRequestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequestClient")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Map a failed `requestToken` call onto the auth taxonomy.
///
/// 400 and 422 mean the broker rejected the scopes. Everything transient
/// becomes `BrokerUnavailable`.
pub fn map_request_error(provider_id: &str, err: RetryableError) -> AuthError {
    match err {
        RetryableError::Http { status, body, .. } if status == 400 || status == 422 => {
            AuthError::invalid_scope(provider_id, body)
        }
        other => map_transport_error(other),
    }
}

/// Map a failed broker call that has no scope semantics.
pub fn map_transport_error(err: RetryableError) -> AuthError {
    match err {
        RetryableError::Invalid(inner) => AuthError::protocol(inner.to_string()),
        RetryableError::Http { status, body, .. } if !(status == 429 || status >= 500) => {
            AuthError::protocol(format!("unexpected HTTP {status}: {body}"))
        }
        other => AuthError::broker_unavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBroker;
    use agentauth_core::Scopes;
    use rstest::rstest;
    use std::time::Duration;
    use url::Url;

    fn request() -> TokenRequest {
        TokenRequest::new("github-provider", Scopes::parse("repo read:user"), "user-1")
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig::new().max_retries(2).fixed(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_ready_token() {
        let broker = Arc::new(MockBroker::new().with_token_response(TokenStatus::Ready {
            access_token: "tok-123".into(),
        }));
        let client = TokenRequestClient::new(broker.clone());

        let outcome = client.request(&request()).await.unwrap();
        match outcome {
            TokenOutcome::Ready(token) => assert_eq!(token.access_token(), "tok-123"),
            other => panic!("expected ready, got {other:?}"),
        }
        assert_eq!(broker.token_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_pending() {
        let url = Url::parse("https://github.com/login/oauth/authorize?c=1").unwrap();
        let broker = Arc::new(MockBroker::new().with_token_response(TokenStatus::Pending {
            authorization_url: url.clone(),
            session_id: "S1".into(),
        }));
        let client = TokenRequestClient::new(broker);

        let outcome = client.request(&request()).await.unwrap();
        assert_eq!(outcome, TokenOutcome::Pending(PendingAuth::new("S1", url)));
    }

    #[tokio::test]
    async fn test_invalid_scope_not_retried() {
        let broker = Arc::new(
            MockBroker::new().with_token_error(RetryableError::http(400, "unknown scope: admin")),
        );
        let client = TokenRequestClient::new(broker.clone()).with_retry_config(fast_retry());

        let err = client.request(&request()).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidScope { .. }));
        assert_eq!(broker.token_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_retried_then_unavailable() {
        let broker = Arc::new(
            MockBroker::new()
                .with_token_error(RetryableError::http(503, "down"))
                .with_token_error(RetryableError::Timeout)
                .with_token_error(RetryableError::transport("refused")),
        );
        let client = TokenRequestClient::new(broker.clone()).with_retry_config(fast_retry());

        let err = client.request(&request()).await.unwrap_err();
        assert!(matches!(err, AuthError::BrokerUnavailable { .. }));
        assert_eq!(broker.token_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers() {
        let broker = Arc::new(
            MockBroker::new()
                .with_token_error(RetryableError::http(502, "bad gateway"))
                .with_token_response(TokenStatus::Ready {
                    access_token: "tok".into(),
                }),
        );
        let client = TokenRequestClient::new(broker).with_retry_config(fast_retry());

        assert!(matches!(
            client.request(&request()).await.unwrap(),
            TokenOutcome::Ready(_)
        ));
    }

    #[tokio::test]
    async fn test_empty_token_is_protocol_error() {
        let broker = Arc::new(MockBroker::new().with_token_response(TokenStatus::Ready {
            access_token: String::new(),
        }));
        let client = TokenRequestClient::new(broker);

        let err = client.request(&request()).await.unwrap_err();
        assert!(matches!(err, AuthError::Protocol(_)));
    }

    #[rstest]
    #[case(RetryableError::http(503, ""), "broker_unavailable")]
    #[case(RetryableError::http(429, ""), "broker_unavailable")]
    #[case(RetryableError::Timeout, "broker_unavailable")]
    #[case(RetryableError::http(404, "no such session"), "protocol")]
    #[case(RetryableError::Invalid(anyhow::anyhow!("bad json")), "protocol")]
    fn test_map_transport_error(#[case] err: RetryableError, #[case] code: &str) {
        assert_eq!(map_transport_error(err).code(), code);
    }
}
