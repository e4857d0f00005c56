//! Auth flow controller.
//!
//! [`AuthFlowController`] drives token acquisition for one request:
//!
//! 1. Ask the broker for a token. A cached grant returns immediately.
//! 2. On PENDING, reuse the cached session for this provider and caller, or
//!    create one and deliver the consent URL exactly once.
//! 3. Poll until the session resolves, times out, or the per-call poll
//!    budget runs out (in which case the call returns [`FlowOutcome::Pending`]
//!    and a later call resumes without re-notifying).
//!
//! Sessions that end in a terminal state are dropped, so the next call
//! starts a fresh consent dance.

use std::sync::Arc;

use agentauth_broker::{IdentityBroker, TokenOutcome, TokenRequest, TokenRequestClient};
use agentauth_core::identifier::generate_flow_id;
use agentauth_core::{AuthError, AuthSession, SessionKey, TokenResult};
use tracing::{debug, info, warn};

use crate::notifier::ConsentNotifier;
use crate::poller::{PollConfig, PollOutcome, TokenPoller};
use crate::store::SessionStore;

/// Result of [`AuthFlowController::obtain_token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// A usable token.
    Ready(TokenResult),
    /// Consent is still outstanding; call again later to resume.
    Pending {
        /// Session being waited on.
        session_id: String,
        /// Polls issued for the session so far.
        attempts: u32,
    },
}

impl FlowOutcome {
    /// The token, if ready.
    pub fn token(&self) -> Option<&TokenResult> {
        match self {
            Self::Ready(token) => Some(token),
            Self::Pending { .. } => None,
        }
    }

    /// Check if consent is still outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// Coordinates token requests, consent notification, and polling.
#[derive(Debug)]
pub struct AuthFlowController {
    client: TokenRequestClient,
    poller: TokenPoller,
    sessions: SessionStore,
}

impl AuthFlowController {
    /// Create a controller over a broker with the given polling parameters.
    ///
    /// Token requests share the poller's transport retry budget.
    pub fn new(broker: Arc<dyn IdentityBroker>, config: PollConfig) -> Self {
        let client =
            TokenRequestClient::new(broker.clone()).with_retry_config(config.retry_config());
        let poller = TokenPoller::new(broker, config);
        Self::from_parts(client, poller)
    }

    /// Create a controller from a preconfigured client and poller.
    pub fn from_parts(client: TokenRequestClient, poller: TokenPoller) -> Self {
        Self {
            client,
            poller,
            sessions: SessionStore::new(),
        }
    }

    /// The polling parameters.
    pub fn poll_config(&self) -> &PollConfig {
        self.poller.config()
    }

    /// Obtain a token for a request, notifying the user at most once per
    /// consent session.
    ///
    /// Notifier failures are logged and never fail the flow.
    pub async fn obtain_token(
        &self,
        request: &TokenRequest,
        notifier: &dyn ConsentNotifier,
    ) -> Result<FlowOutcome, AuthError> {
        let budget = self.poller.config().attempts_per_call;
        self.obtain_token_within(request, notifier, budget).await
    }

    /// Like [`AuthFlowController::obtain_token`], polling at most `budget`
    /// times in this call instead of the configured `attempts_per_call`.
    pub async fn obtain_token_within(
        &self,
        request: &TokenRequest,
        notifier: &dyn ConsentNotifier,
        budget: Option<u32>,
    ) -> Result<FlowOutcome, AuthError> {
        let flow_id = generate_flow_id();
        let key = request.session_key();
        debug!(
            flow_id = %flow_id,
            provider_id = %key.provider_id,
            caller_id = %key.caller_id,
            scopes = %request.scopes,
            "Obtaining token"
        );

        let pending = match self.client.request(request).await? {
            TokenOutcome::Ready(token) => {
                if let Some(stale) = self.sessions.remove(&key) {
                    debug!(
                        flow_id = %flow_id,
                        session_id = %stale.session_id,
                        "Dropping session superseded by a cached grant"
                    );
                }
                info!(flow_id = %flow_id, provider_id = %key.provider_id, "Token ready");
                return Ok(FlowOutcome::Ready(token));
            }
            TokenOutcome::Pending(pending) => pending,
        };

        let reported_session = pending.session_id.clone();
        let (session, notification) = self.sessions.claim(key.clone(), pending);

        if session.session_id != reported_session {
            warn!(
                flow_id = %flow_id,
                session_id = %session.session_id,
                reported_session = %reported_session,
                "Broker reported a different session; keeping the one already notified"
            );
        }

        match notification {
            Some(notification) => {
                info!(
                    flow_id = %flow_id,
                    session_id = %notification.session_id,
                    "Delivering consent URL"
                );
                if let Err(err) = notifier.notify(&notification) {
                    warn!(
                        flow_id = %flow_id,
                        session_id = %notification.session_id,
                        error = %err,
                        "Consent notifier failed"
                    );
                }
            }
            None => debug!(
                flow_id = %flow_id,
                session_id = %session.session_id,
                attempts = session.attempts,
                "Resuming pending session"
            ),
        }

        self.await_consent(&flow_id, key, session, budget).await
    }

    /// The pending session for a key, if any.
    pub fn pending_session(&self, key: &SessionKey) -> Option<AuthSession> {
        self.sessions.get(key)
    }

    /// Forget the session for a key. The next call starts over and notifies
    /// again.
    pub fn abandon(&self, key: &SessionKey) -> Option<AuthSession> {
        let removed = self.sessions.remove(key);
        if let Some(session) = &removed {
            info!(session_id = %session.session_id, key = %key, "Session abandoned");
        }
        removed
    }

    async fn await_consent(
        &self,
        flow_id: &str,
        key: SessionKey,
        mut session: AuthSession,
        budget: Option<u32>,
    ) -> Result<FlowOutcome, AuthError> {
        match self.poller.poll_within(&mut session, budget).await {
            Ok(PollOutcome::Ready(token)) => {
                self.sessions.remove(&key);
                info!(flow_id, session_id = %session.session_id, "Token ready");
                Ok(FlowOutcome::Ready(token))
            }
            Ok(PollOutcome::Suspended) => {
                let outcome = FlowOutcome::Pending {
                    session_id: session.session_id.clone(),
                    attempts: session.attempts,
                };
                self.sessions.insert(key, session);
                Ok(outcome)
            }
            Err(err) if err.is_terminal() => {
                self.sessions.remove(&key);
                warn!(flow_id, error = %err, "Consent session closed");
                Err(err)
            }
            Err(err) => {
                self.sessions.insert(key, session);
                warn!(flow_id, error = %err, "Polling interrupted; session kept for retry");
                Err(err)
            }
        }
    }
}
