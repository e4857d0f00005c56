//! Token, scope, and consent value types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// An ordered, de-duplicated set of OAuth scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scopes(Vec<String>);

impl Scopes {
    /// Create a scope set, dropping blanks and duplicates while keeping order.
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for scope in scopes {
            let scope = scope.into().trim().to_string();
            if !scope.is_empty() && !out.contains(&scope) {
                out.push(scope);
            }
        }
        Self(out)
    }

    /// Parse a comma- or whitespace-separated scope list.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(|c: char| c == ',' || c.is_whitespace()))
    }

    /// Iterate over the scopes.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The scopes as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl<S: Into<String>> FromIterator<S> for Scopes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// An access token obtained from the broker.
///
/// Immutable once built. The caller owns its lifecycle from here on;
/// agentauth keeps no copy.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResult {
    access_token: String,
    obtained_at: DateTime<Utc>,
}

impl TokenResult {
    /// Wrap a freshly issued token, stamped with the current time.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_obtained_at(access_token, Utc::now())
    }

    /// Wrap a token with an explicit acquisition time.
    #[must_use]
    pub fn with_obtained_at(access_token: impl Into<String>, obtained_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            obtained_at,
        }
    }

    /// The bearer credential.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// When the token was handed to us.
    #[must_use]
    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    /// Value for an `Authorization` header.
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Consume and return the raw token.
    #[must_use]
    pub fn into_access_token(self) -> String {
        self.access_token
    }
}

impl fmt::Debug for TokenResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResult")
            .field("access_token", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// The broker's answer when human consent has not been granted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuth {
    /// Browser link the user must visit.
    pub authorization_url: Url,
    /// Broker-side session identifier used for polling.
    pub session_id: String,
}

impl PendingAuth {
    /// Create a pending descriptor.
    #[must_use]
    pub fn new(session_id: impl Into<String>, authorization_url: Url) -> Self {
        Self {
            authorization_url,
            session_id: session_id.into(),
        }
    }
}

/// What a consent sink receives. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentNotification {
    /// Session the consent belongs to.
    pub session_id: String,
    /// Consent link to show to the user.
    pub url: Url,
}

impl ConsentNotification {
    /// Create a notification.
    #[must_use]
    pub fn new(session_id: impl Into<String>, url: Url) -> Self {
        Self {
            session_id: session_id.into(),
            url,
        }
    }
}
