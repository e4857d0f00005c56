//! Scripted broker for testing.
//!
//! [`MockBroker`] answers from pre-configured queues and records every call,
//! so tests can assert exactly how many requests and polls a flow issued.
//!
//! ```rust
//! use agentauth_broker::{MockBroker, SessionStatus, TokenStatus};
//!
//! let broker = MockBroker::new()
//!     .with_session_response("S1", SessionStatus::Pending)
//!     .with_session_response("S1", SessionStatus::Ready { access_token: "tok".into() })
//!     .always_token(TokenStatus::Ready { access_token: "cached".into() });
//! ```

use std::collections::{HashMap, VecDeque};

use agentauth_retries::{RetryResult, RetryableError};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::protocol::{IdentityBroker, SessionStatus, TokenRequest, TokenStatus};

type Scripted<T> = VecDeque<RetryResult<T>>;

#[derive(Debug, Default)]
struct Script {
    tokens: Scripted<TokenStatus>,
    tokens_by_caller: HashMap<String, Scripted<TokenStatus>>,
    token_default: Option<TokenStatus>,
    token_default_by_caller: HashMap<String, TokenStatus>,
    sessions: HashMap<String, Scripted<SessionStatus>>,
    session_defaults: HashMap<String, SessionStatus>,
    token_requests: Vec<TokenRequest>,
    session_checks: Vec<String>,
}

/// A broker that replays scripted answers.
///
/// Lookup order for `request_token`: the caller's queue, the shared queue,
/// the caller's default, the shared default. For `check_session`: the
/// session's queue, then its default. With nothing scripted the call fails
/// with a non-retryable error.
#[derive(Debug, Default)]
pub struct MockBroker {
    script: Mutex<Script>,
}

impl MockBroker {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a `requestToken` answer for any caller.
    #[must_use]
    pub fn with_token_response(self, status: TokenStatus) -> Self {
        self.script.lock().tokens.push_back(Ok(status));
        self
    }

    /// Queue a `requestToken` failure for any caller.
    #[must_use]
    pub fn with_token_error(self, error: RetryableError) -> Self {
        self.script.lock().tokens.push_back(Err(error));
        self
    }

    /// Queue a `requestToken` answer for one caller.
    #[must_use]
    pub fn with_token_response_for(self, caller_id: &str, status: TokenStatus) -> Self {
        self.script
            .lock()
            .tokens_by_caller
            .entry(caller_id.to_string())
            .or_default()
            .push_back(Ok(status));
        self
    }

    /// Answer every unscripted `requestToken` with `status`.
    #[must_use]
    pub fn always_token(self, status: TokenStatus) -> Self {
        self.script.lock().token_default = Some(status);
        self
    }

    /// Answer every unscripted `requestToken` from one caller with `status`.
    #[must_use]
    pub fn always_token_for(self, caller_id: &str, status: TokenStatus) -> Self {
        self.script
            .lock()
            .token_default_by_caller
            .insert(caller_id.to_string(), status);
        self
    }

    /// Queue a `checkSession` answer.
    #[must_use]
    pub fn with_session_response(self, session_id: &str, status: SessionStatus) -> Self {
        self.script
            .lock()
            .sessions
            .entry(session_id.to_string())
            .or_default()
            .push_back(Ok(status));
        self
    }

    /// Queue a `checkSession` failure.
    #[must_use]
    pub fn with_session_error(self, session_id: &str, error: RetryableError) -> Self {
        self.script
            .lock()
            .sessions
            .entry(session_id.to_string())
            .or_default()
            .push_back(Err(error));
        self
    }

    /// Answer every unscripted `checkSession` for a session with `status`.
    #[must_use]
    pub fn always_session(self, session_id: &str, status: SessionStatus) -> Self {
        self.script
            .lock()
            .session_defaults
            .insert(session_id.to_string(), status);
        self
    }

    /// Replace the default answer for a session at runtime.
    pub fn set_session_default(&self, session_id: &str, status: SessionStatus) {
        self.script
            .lock()
            .session_defaults
            .insert(session_id.to_string(), status);
    }

    /// Replace the shared `requestToken` default at runtime.
    pub fn set_token_default(&self, status: TokenStatus) {
        self.script.lock().token_default = Some(status);
    }

    /// Every `requestToken` call received so far.
    pub fn token_requests(&self) -> Vec<TokenRequest> {
        self.script.lock().token_requests.clone()
    }

    /// Every session id polled so far, in order.
    pub fn session_checks(&self) -> Vec<String> {
        self.script.lock().session_checks.clone()
    }

    /// Number of polls for one session.
    pub fn checks_for(&self, session_id: &str) -> usize {
        self.script
            .lock()
            .session_checks
            .iter()
            .filter(|id| id.as_str() == session_id)
            .count()
    }
}

fn unscripted(what: &str) -> RetryableError {
    RetryableError::Invalid(anyhow::anyhow!("MockBroker: no scripted response for {what}"))
}

#[async_trait]
impl IdentityBroker for MockBroker {
    async fn request_token(&self, request: &TokenRequest) -> RetryResult<TokenStatus> {
        let mut script = self.script.lock();
        script.token_requests.push(request.clone());

        if let Some(next) = script
            .tokens_by_caller
            .get_mut(&request.caller_id)
            .and_then(VecDeque::pop_front)
        {
            return next;
        }
        if let Some(next) = script.tokens.pop_front() {
            return next;
        }
        if let Some(status) = script.token_default_by_caller.get(&request.caller_id) {
            return Ok(status.clone());
        }
        script
            .token_default
            .clone()
            .ok_or_else(|| unscripted("requestToken"))
    }

    async fn check_session(&self, session_id: &str) -> RetryResult<SessionStatus> {
        let mut script = self.script.lock();
        script.session_checks.push(session_id.to_string());

        if let Some(next) = script
            .sessions
            .get_mut(session_id)
            .and_then(VecDeque::pop_front)
        {
            return next;
        }
        script
            .session_defaults
            .get(session_id)
            .cloned()
            .ok_or_else(|| unscripted(session_id))
    }
}
