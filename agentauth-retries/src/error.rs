//! Broker call failures.

use std::time::Duration;
use thiserror::Error;

/// A failure of one broker call, classified for retry decisions.
#[derive(Debug, Error)]
pub enum RetryableError {
    /// Broker answered with a non-success status.
    #[error("Broker returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
        /// Parsed `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// No answer within the request timeout.
    #[error("Broker request timed out")]
    Timeout,

    /// Connection refused, reset, or DNS failure.
    #[error("Broker transport error: {0}")]
    Transport(String),

    /// The call cannot succeed by repeating it (bad payload, missing script).
    #[error("{0}")]
    Invalid(#[from] anyhow::Error),
}

impl RetryableError {
    /// Non-success status without a retry hint.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    /// Transport-level failure.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Server-suggested delay, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Http { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Timeouts, transport failures, 429 and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::Timeout | Self::Transport(_) => true,
            Self::Invalid(_) => false,
        }
    }

    /// Status code for HTTP failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RetryableError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() || err.is_request() {
            Self::Transport(err.to_string())
        } else {
            Self::Invalid(err.into())
        }
    }
}

/// Result of a single broker call.
pub type RetryResult<T> = Result<T, RetryableError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(500, true)]
    #[case(503, true)]
    #[case(429, true)]
    #[case(400, false)]
    #[case(422, false)]
    #[case(404, false)]
    fn test_status_classification(#[case] status: u16, #[case] transient: bool) {
        assert_eq!(RetryableError::http(status, "").is_retryable(), transient);
    }

    #[test]
    fn test_transport_failures_are_transient() {
        assert!(RetryableError::Timeout.is_retryable());
        assert!(RetryableError::transport("connection refused").is_retryable());
        assert!(!RetryableError::Invalid(anyhow::anyhow!("bad json")).is_retryable());
    }

    #[test]
    fn test_retry_after_only_on_http() {
        let err = RetryableError::Http {
            status: 429,
            body: String::new(),
            retry_after: Some(Duration::from_secs(5)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));
        assert_eq!(err.status(), Some(429));
        assert_eq!(RetryableError::Timeout.retry_after(), None);
    }
}
