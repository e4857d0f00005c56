//! Error types for agentauth.
//!
//! [`AuthError`] is the single error surfaced by the token acquisition flow.
//! Each variant says whether the caller may simply retry the whole
//! `obtain_token` call or must restart the consent dance.

use thiserror::Error;

/// Errors produced while acquiring a delegated access token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The broker could not be reached or answered with a server error.
    #[error("Identity broker unavailable: {message}")]
    BrokerUnavailable {
        /// Description of the last transport failure.
        message: String,
    },

    /// The broker rejected the requested scopes.
    #[error("Invalid scope for provider '{provider_id}': {message}")]
    InvalidScope {
        /// Provider the scopes were requested for.
        provider_id: String,
        /// Broker's explanation.
        message: String,
    },

    /// The user explicitly refused the access request.
    #[error("Authorization denied for session {session_id}")]
    AuthDenied {
        /// Session that was denied.
        session_id: String,
    },

    /// The consent link expired before the user approved it.
    #[error("Authorization session {session_id} expired")]
    AuthExpired {
        /// Session that expired.
        session_id: String,
    },

    /// The polling budget ran out while consent was still pending.
    #[error("Authorization session {session_id} timed out after {attempts} polls")]
    AuthTimedOut {
        /// Session that timed out.
        session_id: String,
        /// Number of polls issued.
        attempts: u32,
    },

    /// The broker returned a payload that violates the protocol.
    #[error("Broker protocol violation: {0}")]
    Protocol(String),

    /// A session that already reached a terminal state was polled again.
    #[error("Session {session_id} is closed ({state})")]
    SessionClosed {
        /// The closed session.
        session_id: String,
        /// The terminal state it is in.
        state: String,
    },
}

/// Result type alias using [`AuthError`].
pub type Result<T> = std::result::Result<T, AuthError>;

impl AuthError {
    /// Create a broker unavailable error.
    #[must_use]
    pub fn broker_unavailable(message: impl Into<String>) -> Self {
        Self::BrokerUnavailable {
            message: message.into(),
        }
    }

    /// Create an invalid scope error.
    #[must_use]
    pub fn invalid_scope(provider_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidScope {
            provider_id: provider_id.into(),
            message: message.into(),
        }
    }

    /// Create a protocol error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Whether the whole `obtain_token` call may be retried as-is.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BrokerUnavailable { .. })
    }

    /// Whether this error ends the session, so the next call starts a new one.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::AuthDenied { .. } | Self::AuthExpired { .. } | Self::AuthTimedOut { .. }
        )
    }

    /// Short machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::BrokerUnavailable { .. } => "broker_unavailable",
            Self::InvalidScope { .. } => "invalid_scope",
            Self::AuthDenied { .. } => "auth_denied",
            Self::AuthExpired { .. } => "auth_expired",
            Self::AuthTimedOut { .. } => "auth_timed_out",
            Self::Protocol(_) => "protocol",
            Self::SessionClosed { .. } => "session_closed",
        }
    }

    /// Guidance shown to the end user alongside the error.
    #[must_use]
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::BrokerUnavailable { .. } => {
                "The identity service is temporarily unavailable. Please try again shortly."
            }
            Self::InvalidScope { .. } => {
                "The requested permissions are misconfigured. Contact the administrator."
            }
            Self::AuthDenied { .. } => {
                "Access was denied. Ask again to restart authorization if this was a mistake."
            }
            Self::AuthExpired { .. } | Self::AuthTimedOut { .. } => {
                "The authorization link expired. Ask again to receive a fresh link."
            }
            Self::Protocol(_) | Self::SessionClosed { .. } => {
                "Authorization failed unexpectedly. Please try again."
            }
        }
    }
}
