//! # agentauth-broker
//!
//! Identity broker protocol and the client that asks it for tokens.
//!
//! ## Core Concepts
//!
//! - **[`IdentityBroker`]**: The two broker operations, `request_token` and
//!   `check_session`
//! - **[`HttpBroker`]**: JSON-over-HTTP implementation backed by reqwest
//! - **[`TokenRequestClient`]**: One "get or start" request, returning a
//!   ready token or a pending consent descriptor
//! - **[`MockBroker`]**: Scripted broker for tests
//!
//! ## Example
//!
//! ```ignore
//! use agentauth_broker::{HttpBroker, HttpBrokerConfig, TokenRequest, TokenRequestClient};
//! use agentauth_core::Scopes;
//! use std::sync::Arc;
//!
//! let broker = HttpBroker::new(HttpBrokerConfig::new(base_url))?;
//! let client = TokenRequestClient::new(Arc::new(broker));
//!
//! let request = TokenRequest::new("github-provider", Scopes::parse("repo read:user"), "user-1");
//! match client.request(&request).await? {
//!     TokenOutcome::Ready(token) => { /* use it */ }
//!     TokenOutcome::Pending(pending) => { /* show pending.authorization_url */ }
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod http;
pub mod mock;
pub mod protocol;

pub use client::{map_request_error, map_transport_error, TokenOutcome, TokenRequestClient};
pub use http::{HttpBroker, HttpBrokerConfig};
pub use mock::MockBroker;
pub use protocol::{IdentityBroker, SessionStatus, TokenRequest, TokenStatus};
