//! The `fetch_github_profile` tool.
//!
//! The tool obtains a delegated token through the consent flow and hands it
//! to a [`ProfileSource`], which performs the actual provider API calls.
//! While consent is outstanding the tool answers with the consent URL on
//! the first call and a plain "still pending" status afterwards.
//!
//! The tool never waits out a whole consent session: each call polls at most
//! a few times and then hands control back, so the URL reaches the user
//! while the session is still open.

use std::sync::Arc;

use agentauth_broker::TokenRequest;
use agentauth_core::{ConsentNotification, Scopes, TokenResult};
use agentauth_flow::{
    AuthFlowController, ConsentNotifier, FlowOutcome, FnNotifier, RecordingNotifier,
};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    context::ToolContext,
    definition::ToolDefinition,
    errors::ToolError,
    return_types::{ToolResult, ToolReturn},
    tool::Tool,
};

/// Name the tool is advertised under.
pub const FETCH_PROFILE_TOOL: &str = "fetch_github_profile";

/// Polls per call when neither the tool nor the controller sets a budget.
pub const DEFAULT_POLLS_PER_CALL: u32 = 1;

/// Fetches profile data once a token is available.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the profile using `token` as bearer credential.
    async fn fetch(&self, token: &TokenResult) -> anyhow::Result<JsonValue>;
}

/// Tool that fetches the caller's provider profile.
pub struct FetchProfileTool {
    flow: Arc<AuthFlowController>,
    source: Arc<dyn ProfileSource>,
    provider_id: String,
    scopes: Scopes,
    callback_url: Option<Url>,
    notifier: Option<Arc<dyn ConsentNotifier>>,
    polls_per_call: Option<u32>,
}

impl FetchProfileTool {
    /// Create the tool.
    pub fn new(
        flow: Arc<AuthFlowController>,
        source: Arc<dyn ProfileSource>,
        provider_id: impl Into<String>,
        scopes: Scopes,
    ) -> Self {
        Self {
            flow,
            source,
            provider_id: provider_id.into(),
            scopes,
            callback_url: None,
            notifier: None,
            polls_per_call: None,
        }
    }

    /// Set the OAuth callback URL sent with token requests.
    #[must_use]
    pub fn with_callback_url(mut self, url: Url) -> Self {
        self.callback_url = Some(url);
        self
    }

    /// Also forward consent URLs to another sink, e.g. a UI channel.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn ConsentNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Poll at most `polls` times per call (at least once).
    #[must_use]
    pub fn with_polls_per_call(mut self, polls: u32) -> Self {
        self.polls_per_call = Some(polls.max(1));
        self
    }

    /// Polls issued per call: the tool's own setting, else the controller's
    /// `attempts_per_call`, else [`DEFAULT_POLLS_PER_CALL`].
    pub fn polls_per_call(&self) -> u32 {
        self.polls_per_call
            .or(self.flow.poll_config().attempts_per_call)
            .unwrap_or(DEFAULT_POLLS_PER_CALL)
            .max(1)
    }

    fn token_request(&self, caller_id: &str) -> TokenRequest {
        let request = TokenRequest::new(self.provider_id.clone(), self.scopes.clone(), caller_id);
        match &self.callback_url {
            Some(url) => request.with_callback_url(url.clone()),
            None => request,
        }
    }
}

fn check_args(args: &JsonValue) -> Result<(), ToolError> {
    match args {
        JsonValue::Null => Ok(()),
        JsonValue::Object(map) if map.is_empty() => Ok(()),
        JsonValue::Object(map) => Err(ToolError::invalid_args(format!(
            "unexpected parameters: {}",
            map.keys().cloned().collect::<Vec<_>>().join(", ")
        ))),
        other => Err(ToolError::invalid_args(format!(
            "expected an object, got {other}"
        ))),
    }
}

#[async_trait]
impl<Deps: Send + Sync> Tool<Deps> for FetchProfileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            FETCH_PROFILE_TOOL,
            "Fetch the user's GitHub profile, repositories, and language statistics. \
             The first call may ask the user to authorize GitHub access.",
        )
    }

    async fn call(&self, ctx: &ToolContext<Deps>, args: JsonValue) -> ToolResult {
        check_args(&args)?;
        if ctx.caller_id.is_empty() {
            return Err(ToolError::invalid_args("caller id is required"));
        }

        let request = self.token_request(&ctx.caller_id);
        let delivered = RecordingNotifier::new();
        let sink = FnNotifier::new(|notification: &ConsentNotification| {
            delivered.notify(notification)?;
            match &self.notifier {
                Some(extra) => extra.notify(notification),
                None => Ok(()),
            }
        });

        debug!(run_id = %ctx.run_id, caller_id = %ctx.caller_id, "Fetching profile");
        let budget = Some(self.polls_per_call());
        let outcome = match self.flow.obtain_token_within(&request, &sink, budget).await {
            Ok(outcome) => outcome,
            // Non-terminal errors keep the session marked as notified.
            Err(err) if !err.is_terminal() => match delivered.last() {
                Some(notification) => {
                    warn!(
                        run_id = %ctx.run_id,
                        session_id = %notification.session_id,
                        error = %err,
                        "Polling failed after consent was requested; returning the URL"
                    );
                    let ret = ToolReturn::authorization_required(
                        notification.url,
                        notification.session_id,
                    );
                    return Ok(attach_call_id(ret, ctx));
                }
                None => return Err(err.into()),
            },
            Err(err) => return Err(err.into()),
        };

        let ret = match outcome {
            FlowOutcome::Ready(token) => {
                let profile = self.source.fetch(&token).await?;
                info!(run_id = %ctx.run_id, elapsed_ms = ctx.elapsed_ms(), "Profile fetched");
                ToolReturn::json(profile)
            }
            FlowOutcome::Pending {
                session_id,
                attempts,
            } => match delivered.last() {
                Some(notification) => {
                    ToolReturn::authorization_required(notification.url, notification.session_id)
                }
                None => ToolReturn::awaiting_consent(session_id, attempts),
            },
        };

        Ok(attach_call_id(ret, ctx))
    }
}

fn attach_call_id<Deps>(ret: ToolReturn, ctx: &ToolContext<Deps>) -> ToolReturn {
    match &ctx.tool_call_id {
        Some(id) => ret.with_call_id(id.clone()),
        None => ret,
    }
}

impl std::fmt::Debug for FetchProfileTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchProfileTool")
            .field("provider_id", &self.provider_id)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::return_types::ToolReturnContent;
    use agentauth_broker::{MockBroker, SessionStatus, TokenStatus};
    use agentauth_core::AuthError;
    use agentauth_flow::PollConfig;
    use agentauth_retries::RetryableError;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[derive(Default)]
    struct StaticProfile {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProfileSource for StaticProfile {
        async fn fetch(&self, token: &TokenResult) -> anyhow::Result<JsonValue> {
            self.seen.lock().push(token.access_token().to_string());
            Ok(serde_json::json!({"login": "octocat", "public_repos": 8}))
        }
    }

    fn consent_url() -> Url {
        Url::parse("https://github.com/login/oauth/authorize?state=S1").unwrap()
    }

    fn setup(broker: &Arc<MockBroker>) -> (FetchProfileTool, Arc<StaticProfile>) {
        let config = PollConfig::new(Duration::from_secs(5), 10).with_attempts_per_call(1);
        let flow = Arc::new(AuthFlowController::new(broker.clone(), config));
        let source = Arc::new(StaticProfile::default());
        let tool = FetchProfileTool::new(
            flow,
            source.clone(),
            "github-provider",
            Scopes::parse("repo read:user"),
        );
        (tool, source)
    }

    fn pending_broker() -> Arc<MockBroker> {
        Arc::new(
            MockBroker::new()
                .always_token(TokenStatus::Pending {
                    authorization_url: consent_url(),
                    session_id: "S1".into(),
                })
                .always_session("S1", SessionStatus::Pending),
        )
    }

    #[test]
    fn test_definition() {
        let broker = Arc::new(MockBroker::new());
        let (tool, _) = setup(&broker);
        let def = Tool::<()>::definition(&tool);
        assert_eq!(def.name, FETCH_PROFILE_TOOL);
        assert!(def.required().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_consent_url_returned_once_then_profile() {
        let broker = pending_broker();
        let (tool, source) = setup(&broker);
        let ctx = ToolContext::new((), "U1");

        let first = tool.call(&ctx, JsonValue::Null).await.unwrap();
        assert_eq!(
            first.content,
            ToolReturnContent::AuthorizationRequired {
                url: consent_url(),
                session_id: "S1".into()
            }
        );

        let second = tool.call(&ctx, serde_json::json!({})).await.unwrap();
        assert!(matches!(
            second.content,
            ToolReturnContent::AwaitingConsent { attempts: 2, .. }
        ));

        broker.set_session_default(
            "S1",
            SessionStatus::Ready {
                access_token: "tok-123".into(),
            },
        );
        let third = tool.call(&ctx, JsonValue::Null).await.unwrap();
        assert_eq!(third.as_json().unwrap()["login"], "octocat");
        assert_eq!(*source.seen.lock(), vec!["tok-123".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consent_url_survives_poll_failure() {
        let broker = Arc::new(
            MockBroker::new()
                .always_token(TokenStatus::Pending {
                    authorization_url: consent_url(),
                    session_id: "S1".into(),
                })
                .with_session_error("S1", RetryableError::Timeout)
                .with_session_error("S1", RetryableError::Timeout)
                .with_session_error("S1", RetryableError::Timeout),
        );
        let (tool, _) = setup(&broker);
        let ctx = ToolContext::new((), "U1");

        let first = tool.call(&ctx, JsonValue::Null).await.unwrap();
        assert_eq!(
            first.content,
            ToolReturnContent::AuthorizationRequired {
                url: consent_url(),
                session_id: "S1".into()
            }
        );
        assert_eq!(broker.checks_for("S1"), 3);

        broker.set_session_default("S1", SessionStatus::Pending);
        let second = tool.call(&ctx, JsonValue::Null).await.unwrap();
        assert_eq!(
            second.content,
            ToolReturnContent::AwaitingConsent {
                session_id: "S1".into(),
                attempts: 2
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failure_on_resumed_call_is_an_error() {
        let broker = Arc::new(
            MockBroker::new()
                .always_token(TokenStatus::Pending {
                    authorization_url: consent_url(),
                    session_id: "S1".into(),
                })
                .with_session_response("S1", SessionStatus::Pending)
                .with_session_error("S1", RetryableError::Timeout)
                .with_session_error("S1", RetryableError::Timeout)
                .with_session_error("S1", RetryableError::Timeout)
                .always_session("S1", SessionStatus::Pending),
        );
        let (tool, _) = setup(&broker);
        let ctx = ToolContext::new((), "U1");

        let first = tool.call(&ctx, JsonValue::Null).await.unwrap();
        assert!(matches!(
            first.content,
            ToolReturnContent::AuthorizationRequired { .. }
        ));

        let err = tool.call(&ctx, JsonValue::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::Auth(AuthError::BrokerUnavailable { .. })));

        let third = tool.call(&ctx, JsonValue::Null).await.unwrap();
        assert!(matches!(
            third.content,
            ToolReturnContent::AwaitingConsent { attempts: 3, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_config_returns_url_without_waiting() {
        let broker = pending_broker();
        let flow = Arc::new(AuthFlowController::new(broker.clone(), PollConfig::default()));
        let tool = FetchProfileTool::new(
            flow,
            Arc::new(StaticProfile::default()),
            "github-provider",
            Scopes::parse("repo read:user"),
        );
        assert_eq!(tool.polls_per_call(), DEFAULT_POLLS_PER_CALL);

        let started = tokio::time::Instant::now();
        let ret = tool
            .call(&ToolContext::new((), "U1"), JsonValue::Null)
            .await
            .unwrap();

        assert_eq!(
            ret.content,
            ToolReturnContent::AuthorizationRequired {
                url: consent_url(),
                session_id: "S1".into()
            }
        );
        assert_eq!(broker.checks_for("S1"), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extra_notifier_receives_url() {
        let broker = pending_broker();
        let (tool, _) = setup(&broker);
        let ui = Arc::new(RecordingNotifier::new());
        let tool = tool.with_notifier(ui.clone());

        tool.call(&ToolContext::new((), "U1"), JsonValue::Null)
            .await
            .unwrap();
        tool.call(&ToolContext::new((), "U1"), JsonValue::Null)
            .await
            .unwrap();

        assert_eq!(ui.count(), 1);
        assert_eq!(ui.last().unwrap().url, consent_url());
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_surfaces_auth_error() {
        let broker = Arc::new(
            MockBroker::new()
                .always_token(TokenStatus::Pending {
                    authorization_url: consent_url(),
                    session_id: "S1".into(),
                })
                .always_session("S1", SessionStatus::Denied),
        );
        let (tool, source) = setup(&broker);

        let err = tool
            .call(&ToolContext::new((), "U1"), JsonValue::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Auth(AuthError::AuthDenied { .. })));
        assert!(source.seen.lock().is_empty());
    }

    struct FailingProfile;

    #[async_trait]
    impl ProfileSource for FailingProfile {
        async fn fetch(&self, _token: &TokenResult) -> anyhow::Result<JsonValue> {
            anyhow::bail!("GitHub API returned 401")
        }
    }

    #[tokio::test]
    async fn test_profile_source_failure() {
        let broker = Arc::new(MockBroker::new().always_token(TokenStatus::Ready {
            access_token: "tok".into(),
        }));
        let flow = Arc::new(AuthFlowController::new(broker, PollConfig::default()));
        let tool = FetchProfileTool::new(
            flow,
            Arc::new(FailingProfile),
            "github-provider",
            Scopes::parse("read:user"),
        );

        let err = tokio_test::assert_err!(tool.call(&ToolContext::new((), "U1"), JsonValue::Null).await);
        assert!(matches!(err, ToolError::Profile(_)));
        assert_eq!(err.code(), "profile_fetch");
    }

    #[tokio::test]
    async fn test_rejects_unexpected_arguments() {
        let broker = Arc::new(MockBroker::new());
        let (tool, _) = setup(&broker);

        let err = tokio_test::assert_err!(
            tool.call(
                &ToolContext::new((), "U1"),
                serde_json::json!({"user": "someone-else"}),
            )
            .await
        );
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(broker.token_requests().is_empty());
    }

    #[tokio::test]
    async fn test_callback_url_is_forwarded() {
        let broker = Arc::new(MockBroker::new().always_token(TokenStatus::Ready {
            access_token: "tok".into(),
        }));
        let (tool, _) = setup(&broker);
        let callback = Url::parse("https://agent.example.com/callback").unwrap();
        let tool = tool.with_callback_url(callback.clone());

        let ctx = ToolContext::new((), "U1").with_tool_call_id("call_7");
        let ret = tokio_test::assert_ok!(tool.call(&ctx, JsonValue::Null).await);
        assert!(!ret.needs_consent());
        assert_eq!(ret.tool_call_id.as_deref(), Some("call_7"));

        let requests = broker.token_requests();
        assert_eq!(requests[0].callback_url, Some(callback));
        assert_eq!(requests[0].caller_id, "U1");
    }
}
