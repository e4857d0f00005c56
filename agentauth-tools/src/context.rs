//! Context passed to tools during execution.

use std::sync::Arc;

use agentauth_core::identifier::generate_run_id;
use chrono::{DateTime, Utc};

/// Who is calling a tool, plus caller-provided dependencies.
///
/// `caller_id` identifies the end user on whose behalf the agent acts;
/// tokens and consent sessions are scoped to it.
///
/// ```rust
/// use agentauth_tools::ToolContext;
///
/// let ctx = ToolContext::new((), "user-42").with_tool_call_id("call_1");
/// assert_eq!(ctx.caller_id, "user-42");
/// ```
#[derive(Debug, Clone)]
pub struct ToolContext<Deps = ()> {
    /// Shared dependencies of the host application.
    pub deps: Arc<Deps>,

    /// End user the agent acts for.
    pub caller_id: String,

    /// Correlates log lines of one invocation.
    pub run_id: String,

    /// When the invocation started.
    pub started_at: DateTime<Utc>,

    /// Tool call ID, if the model supplied one; echoed on the return.
    pub tool_call_id: Option<String>,
}

impl<Deps> ToolContext<Deps> {
    /// Create a context for a caller.
    #[must_use]
    pub fn new(deps: Deps, caller_id: impl Into<String>) -> Self {
        Self::from_arc(Arc::new(deps), caller_id)
    }

    /// Create a context sharing already-wrapped deps.
    #[must_use]
    pub fn from_arc(deps: Arc<Deps>, caller_id: impl Into<String>) -> Self {
        Self {
            deps,
            caller_id: caller_id.into(),
            run_id: generate_run_id(),
            started_at: Utc::now(),
            tool_call_id: None,
        }
    }

    /// Set the tool call ID.
    #[must_use]
    pub fn with_tool_call_id(mut self, id: impl Into<String>) -> Self {
        self.tool_call_id = Some(id.into());
        self
    }

    /// Milliseconds since the invocation started.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}
