//! Identity broker protocol.
//!
//! The broker exposes two operations:
//!
//! - `requestToken(providerId, scopes)`: either a token or a pending
//!   authorization (consent URL + session id)
//! - `checkSession(sessionId)`: READY, PENDING, DENIED or EXPIRED
//!
//! Both answers are tagged by a `status` field on the wire.

use agentauth_core::{Scopes, SessionKey};
use agentauth_retries::RetryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

/// A request for a delegated token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    /// Identity provider registered with the broker.
    pub provider_id: String,
    /// Requested scopes.
    pub scopes: Scopes,
    /// End user the token is for.
    pub caller_id: String,
    /// Where the browser lands after consent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<Url>,
}

impl TokenRequest {
    /// Create a token request.
    #[must_use]
    pub fn new(
        provider_id: impl Into<String>,
        scopes: Scopes,
        caller_id: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            scopes,
            caller_id: caller_id.into(),
            callback_url: None,
        }
    }

    /// Set the post-consent callback URL.
    #[must_use]
    pub fn with_callback_url(mut self, url: Url) -> Self {
        self.callback_url = Some(url);
        self
    }

    /// Key under which this request's session is cached.
    #[must_use]
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(&self.provider_id, &self.caller_id)
    }
}

/// Broker answer to `requestToken`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenStatus {
    /// A cached, non-expired grant exists.
    Ready {
        /// The access token.
        access_token: String,
    },
    /// Human consent is required.
    Pending {
        /// Consent link.
        authorization_url: Url,
        /// Session to poll.
        session_id: String,
    },
}

/// Broker answer to `checkSession`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Consent granted, token issued.
    Ready {
        /// The access token.
        access_token: String,
    },
    /// Consent not granted yet.
    Pending,
    /// The user refused.
    Denied,
    /// The consent link is no longer valid.
    Expired,
}

impl SessionStatus {
    /// Short label for logging.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "READY",
            Self::Pending => "PENDING",
            Self::Denied => "DENIED",
            Self::Expired => "EXPIRED",
        }
    }
}

/// The identity broker, as seen by agentauth.
///
/// Implementations perform exactly one remote call per method and report
/// transport problems as [`agentauth_retries::RetryableError`]; retrying is
/// the caller's business.
#[async_trait]
pub trait IdentityBroker: Send + Sync {
    /// Get a token, or start (or continue) a consent session.
    async fn request_token(&self, request: &TokenRequest) -> RetryResult<TokenStatus>;

    /// Ask whether a consent session has produced a token.
    async fn check_session(&self, session_id: &str) -> RetryResult<SessionStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_token_status_wire_format() {
        let pending: TokenStatus = serde_json::from_value(serde_json::json!({
            "status": "PENDING",
            "authorization_url": "https://github.com/login/oauth/authorize?x=1",
            "session_id": "S1"
        }))
        .unwrap();

        assert_eq!(
            pending,
            TokenStatus::Pending {
                authorization_url: Url::parse("https://github.com/login/oauth/authorize?x=1")
                    .unwrap(),
                session_id: "S1".into(),
            }
        );

        let ready: TokenStatus =
            serde_json::from_str(r#"{"status":"READY","access_token":"tok-123"}"#).unwrap();
        assert_eq!(
            ready,
            TokenStatus::Ready {
                access_token: "tok-123".into()
            }
        );
    }

    #[test]
    fn test_session_status_wire_format() {
        let denied: SessionStatus = serde_json::from_str(r#"{"status":"DENIED"}"#).unwrap();
        assert_eq!(denied, SessionStatus::Denied);

        let expired: SessionStatus = serde_json::from_str(r#"{"status":"EXPIRED"}"#).unwrap();
        assert_eq!(expired.label(), "EXPIRED");
    }

    #[test]
    fn test_request_serialization_skips_missing_callback() {
        let request = TokenRequest::new("github-provider", Scopes::parse("repo"), "u1");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "provider_id": "github-provider",
                "scopes": ["repo"],
                "caller_id": "u1"
            })
        );
        assert_eq!(request.session_key(), SessionKey::new("github-provider", "u1"));
    }
}
