//! Errors returned by tools.

use agentauth_core::AuthError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a tool call failed.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Token acquisition failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The model passed arguments the tool does not accept.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The token was obtained but the provider calls failed.
    #[error("Profile fetch failed: {0}")]
    Profile(#[from] anyhow::Error),
}

impl ToolError {
    /// Whether calling the tool again may succeed.
    ///
    /// Expired and timed-out consent counts: the next call starts a fresh
    /// session.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Auth(err) => {
                err.is_retryable()
                    || matches!(err, AuthError::AuthExpired { .. } | AuthError::AuthTimedOut { .. })
            }
            Self::InvalidArguments(_) | Self::Profile(_) => false,
        }
    }

    /// Shorthand for [`ToolError::InvalidArguments`].
    #[must_use]
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Short machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth(err) => err.code(),
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::Profile(_) => "profile_fetch",
        }
    }

    /// Text suitable for showing to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(err) => format!("{err}. {}", err.remediation()),
            other => other.to_string(),
        }
    }
}

/// Serializable form of a [`ToolError`], carried in tool returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolErrorInfo {
    /// Value of [`ToolError::code`].
    pub error_type: String,
    /// Value of [`ToolError::user_message`].
    pub message: String,
    /// Value of [`ToolError::is_retryable`].
    pub retryable: bool,
}

impl From<&ToolError> for ToolErrorInfo {
    fn from(err: &ToolError) -> Self {
        Self {
            error_type: err.code().to_string(),
            message: err.user_message(),
            retryable: err.is_retryable(),
        }
    }
}
