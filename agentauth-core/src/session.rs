//! Authorization session model.
//!
//! An [`AuthSession`] is created the first time the broker reports that
//! consent is required, and lives until a token is returned or the broker
//! declares it dead. It moves through a small state machine:
//!
//! ```text
//! PENDING ──ready──▶ AUTHORIZED
//!    │
//!    └──denied/expired/timed out──▶ EXPIRED
//! ```
//!
//! Both right-hand states are terminal; polling a terminal session is an
//! error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::errors::AuthError;
use crate::token::{ConsentNotification, PendingAuth};

/// Partition key for cached sessions: one provider, one caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Identity provider, e.g. `github-provider`.
    pub provider_id: String,
    /// End user (or agent session) the token is obtained for.
    pub caller_id: String,
}

impl SessionKey {
    /// Create a session key.
    #[must_use]
    pub fn new(provider_id: impl Into<String>, caller_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            caller_id: caller_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider_id, self.caller_id)
    }
}

/// Lifecycle state of an [`AuthSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Waiting for the user to approve in the browser.
    Pending,
    /// The broker issued a token.
    Authorized,
    /// The session is no longer usable.
    Expired,
}

impl SessionState {
    /// Whether no further polls may happen in this state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Authorized => "AUTHORIZED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// A pending authorization tracked by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Broker session identifier.
    pub session_id: String,
    /// Consent link for this session.
    pub authorization_url: Url,
    /// Current state.
    pub state: SessionState,
    /// Whether the consent link was handed to a notifier.
    pub notified: bool,
    /// Polls issued so far, across all resumed calls.
    pub attempts: u32,
    /// When the session was first reported.
    pub created_at: DateTime<Utc>,
    /// When the session last changed.
    pub updated_at: DateTime<Utc>,
}

impl AuthSession {
    /// Create a fresh pending session.
    #[must_use]
    pub fn new(session_id: impl Into<String>, authorization_url: Url) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            authorization_url,
            state: SessionState::Pending,
            notified: false,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a session from the broker's pending descriptor.
    #[must_use]
    pub fn from_pending(pending: PendingAuth) -> Self {
        Self::new(pending.session_id, pending.authorization_url)
    }

    /// Check if the session is still waiting for consent.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == SessionState::Pending
    }

    /// Fail with [`AuthError::SessionClosed`] unless the session may be polled.
    pub fn ensure_pollable(&self) -> Result<(), AuthError> {
        if self.state.is_terminal() {
            return Err(AuthError::SessionClosed {
                session_id: self.session_id.clone(),
                state: self.state.to_string(),
            });
        }
        Ok(())
    }

    /// Record one poll attempt and return the new count.
    pub fn record_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.updated_at = Utc::now();
        self.attempts
    }

    /// Take the consent notification if it has not been delivered yet.
    ///
    /// Returns `Some` at most once over the session's lifetime; the flag is
    /// set before the caller gets the value.
    pub fn take_notification(&mut self) -> Option<ConsentNotification> {
        if self.notified {
            return None;
        }
        self.notified = true;
        self.updated_at = Utc::now();
        Some(ConsentNotification::new(
            self.session_id.clone(),
            self.authorization_url.clone(),
        ))
    }

    /// Transition PENDING → AUTHORIZED.
    pub fn authorize(&mut self) -> Result<(), AuthError> {
        self.ensure_pollable()?;
        self.state = SessionState::Authorized;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Transition PENDING → EXPIRED.
    pub fn expire(&mut self) -> Result<(), AuthError> {
        self.ensure_pollable()?;
        self.state = SessionState::Expired;
        self.updated_at = Utc::now();
        Ok(())
    }
}
