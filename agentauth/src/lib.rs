//! # agentauth
//!
//! Delegated OAuth token acquisition for long-running agents.
//!
//! An agent acting for an end user asks an identity broker for a provider
//! token. If the user has not consented yet, the broker answers with a
//! consent URL; agentauth delivers that URL to the user exactly once,
//! polls the broker without blocking a worker thread, and hands back the
//! token once the user approves. A call that runs out of its poll budget
//! returns "pending" and the next call resumes the same session silently.
//!
//! ## Quick Start
//!
//! ```ignore
//! use agentauth::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     agentauth::init_tracing()?;
//!
//!     let config = AuthConfig::from_env("AGENTAUTH")?;
//!     let flow = config.build_controller()?;
//!
//!     let request = config.token_request("user-42");
//!     match flow.obtain_token(&request, &TracingNotifier).await? {
//!         FlowOutcome::Ready(token) => println!("got {token:?}"),
//!         FlowOutcome::Pending { .. } => println!("waiting for consent"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`agentauth_core`] - Session model, token types, and errors
//! - [`agentauth_retries`] - Bounded retries for transient broker failures
//! - [`agentauth_broker`] - Broker protocol, HTTP binding, and mock
//! - [`agentauth_flow`] - Notifier, poller, and flow controller
//! - [`agentauth_tools`] - Agent-facing tools and reply envelope

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod telemetry;

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Session model, token types, and errors.
pub use agentauth_core as core;

/// Bounded retries.
pub use agentauth_retries as retries;

/// Broker protocol and clients.
pub use agentauth_broker as broker;

/// Consent flow.
pub use agentauth_flow as flow;

/// Agent-facing tools.
pub use agentauth_tools as tools;

// ============================================================================
// Flat Re-exports
// ============================================================================

pub use agentauth_broker::{HttpBroker, HttpBrokerConfig, IdentityBroker, MockBroker, TokenRequest};
pub use agentauth_core::{
    AuthError, AuthSession, ConsentNotification, PendingAuth, Scopes, SessionKey, SessionState,
    TokenResult,
};
pub use agentauth_flow::{
    AuthFlowController, ChannelNotifier, ConsentNotifier, FlowOutcome, FnNotifier, NotifyError,
    PollConfig, RecordingNotifier, TokenPoller, TracingNotifier,
};
pub use agentauth_tools::{AgentReply, FetchProfileTool, ProfileSource, Tool, ToolContext};
pub use config::{AuthConfig, ConfigError};
pub use telemetry::{init_json_tracing, init_tracing};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        AgentReply, AuthConfig, AuthError, AuthFlowController, ConsentNotifier, FetchProfileTool,
        FlowOutcome, PollConfig, ProfileSource, Scopes, TokenRequest, TokenResult, Tool,
        ToolContext, TracingNotifier,
    };
}
