//! # agentauth-flow
//!
//! Resumable user-consent flow for delegated OAuth tokens.
//!
//! ## Core Concepts
//!
//! - **[`AuthFlowController`]**: Entry point; `obtain_token` returns a ready
//!   token or reports that consent is still pending
//! - **[`TokenPoller`]**: Polls a consent session at a fixed interval with a
//!   bounded budget
//! - **[`ConsentNotifier`]**: Sink that receives the consent URL, at most
//!   once per session
//! - **[`SessionStore`]**: Pending sessions keyed by provider and caller
//!
//! ## Example
//!
//! ```ignore
//! use agentauth_flow::{AuthFlowController, FlowOutcome, PollConfig, TracingNotifier};
//!
//! let flow = AuthFlowController::new(broker, PollConfig::default());
//! match flow.obtain_token(&request, &TracingNotifier).await? {
//!     FlowOutcome::Ready(token) => call_api(token.bearer_header()).await?,
//!     FlowOutcome::Pending { .. } => println!("waiting for the user"),
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod controller;
pub mod notifier;
pub mod poller;
pub mod store;

pub use controller::{AuthFlowController, FlowOutcome};
pub use notifier::{
    ChannelNotifier, ConsentNotifier, FnNotifier, NotifyError, RecordingNotifier, TracingNotifier,
};
pub use poller::{PollConfig, PollOutcome, PollStep, TokenPoller};
pub use store::SessionStore;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        AuthFlowController, ConsentNotifier, FlowOutcome, PollConfig, TokenPoller,
        TracingNotifier,
    };
}
