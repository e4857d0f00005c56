//! Session poller.
//!
//! [`TokenPoller`] asks the broker for the status of a pending session at a
//! fixed interval. Waiting goes through `tokio::time::sleep`, so only the
//! polling task is suspended. Each broker call gets its own small transport
//! retry budget; the poll budget (`max_attempts`) is counted on the session
//! and survives across calls.

use std::sync::Arc;
use std::time::Duration;

use agentauth_broker::{map_transport_error, IdentityBroker, SessionStatus};
use agentauth_core::{AuthError, AuthSession, TokenResult};
use agentauth_retries::{with_retry, RetryConfig};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Polling parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two polls of the same session.
    pub interval: Duration,
    /// Total polls allowed for one session before it times out.
    pub max_attempts: u32,
    /// Polls allowed within a single call before returning pending.
    /// `None` polls until the session resolves.
    pub attempts_per_call: Option<u32>,
    /// Transport retries for a single `checkSession` call.
    pub transport_retries: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
            attempts_per_call: None,
            transport_retries: 2,
        }
    }
}

impl PollConfig {
    /// Create a config with an interval and a total poll budget.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            ..Default::default()
        }
    }

    /// Limit the polls issued per call.
    #[must_use]
    pub fn with_attempts_per_call(mut self, attempts: u32) -> Self {
        self.attempts_per_call = Some(attempts);
        self
    }

    /// Set the transport retries per broker call.
    #[must_use]
    pub fn with_transport_retries(mut self, retries: u32) -> Self {
        self.transport_retries = retries;
        self
    }

    /// Retry config derived from these parameters.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::for_broker(self.transport_retries)
    }
}

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Consent was granted.
    Ready(TokenResult),
    /// Still waiting; poll again after the given delay.
    Pending {
        /// Delay before the next poll.
        next_poll_in: Duration,
    },
}

/// Result of a polling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Consent was granted.
    Ready(TokenResult),
    /// The per-call budget ran out; the session is still pending.
    Suspended,
}

/// Polls the broker until a session resolves.
#[derive(Clone)]
pub struct TokenPoller {
    broker: Arc<dyn IdentityBroker>,
    config: PollConfig,
    retry: RetryConfig,
}

impl TokenPoller {
    /// Create a poller.
    pub fn new(broker: Arc<dyn IdentityBroker>, config: PollConfig) -> Self {
        let retry = config.retry_config();
        Self {
            broker,
            config,
            retry,
        }
    }

    /// Override the retry config used for each broker call.
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The polling parameters.
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Issue a single poll and apply its result to the session.
    ///
    /// Denied, expired, and timed-out sessions move to `EXPIRED` and the
    /// matching error is returned. A granted session moves to `AUTHORIZED`.
    pub async fn tick(&self, session: &mut AuthSession) -> Result<PollStep, AuthError> {
        session.ensure_pollable()?;

        if session.attempts >= self.config.max_attempts {
            return Err(self.time_out(session));
        }

        let attempt = session.record_attempt();
        let session_id = session.session_id.clone();
        debug!(session_id = %session_id, attempt, "Polling session status");

        let status = with_retry(&self.retry, || self.broker.check_session(&session_id))
            .await
            .map_err(map_transport_error)?;

        match status {
            SessionStatus::Ready { access_token } => {
                if access_token.is_empty() {
                    return Err(AuthError::protocol("READY response carried an empty token"));
                }
                session.authorize()?;
                info!(session_id = %session_id, attempt, "Consent granted");
                Ok(PollStep::Ready(TokenResult::new(access_token)))
            }
            SessionStatus::Pending if attempt >= self.config.max_attempts => {
                Err(self.time_out(session))
            }
            SessionStatus::Pending => Ok(PollStep::Pending {
                next_poll_in: self.config.interval,
            }),
            SessionStatus::Denied => {
                session.expire()?;
                warn!(session_id = %session_id, "User denied consent");
                Err(AuthError::AuthDenied { session_id })
            }
            SessionStatus::Expired => {
                session.expire()?;
                warn!(session_id = %session_id, "Consent link expired");
                Err(AuthError::AuthExpired { session_id })
            }
        }
    }

    /// Poll until the session resolves or the configured per-call budget
    /// runs out.
    ///
    /// Never sleeps after the last poll of a call.
    pub async fn poll(&self, session: &mut AuthSession) -> Result<PollOutcome, AuthError> {
        self.poll_within(session, self.config.attempts_per_call).await
    }

    /// Like [`TokenPoller::poll`] with an explicit per-call budget.
    /// `None` polls until the session resolves; `Some(0)` still polls once.
    pub async fn poll_within(
        &self,
        session: &mut AuthSession,
        budget: Option<u32>,
    ) -> Result<PollOutcome, AuthError> {
        let mut issued = 0u32;
        loop {
            match self.tick(session).await? {
                PollStep::Ready(token) => return Ok(PollOutcome::Ready(token)),
                PollStep::Pending { next_poll_in } => {
                    issued += 1;
                    if budget.is_some_and(|cap| issued >= cap) {
                        debug!(
                            session_id = %session.session_id,
                            attempts = session.attempts,
                            "Poll budget for this call used up"
                        );
                        return Ok(PollOutcome::Suspended);
                    }
                    sleep(next_poll_in).await;
                }
            }
        }
    }

    fn time_out(&self, session: &mut AuthSession) -> AuthError {
        if let Err(err) = session.expire() {
            return err;
        }
        warn!(
            session_id = %session.session_id,
            attempts = session.attempts,
            "Gave up waiting for consent"
        );
        AuthError::AuthTimedOut {
            session_id: session.session_id.clone(),
            attempts: session.attempts,
        }
    }
}

impl std::fmt::Debug for TokenPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPoller")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
