//! # agentauth-core
//!
//! Core types and error handling for agentauth.
//!
//! This crate holds the data model shared by every other agentauth crate:
//!
//! - **[`AuthSession`]**: A broker-tracked pending authorization, with its
//!   consent URL and whether that URL has already been delivered
//! - **[`TokenResult`]**: An access token handed back to the caller
//! - **[`PendingAuth`]**: The broker's "consent required" descriptor
//! - **[`ConsentNotification`]**: The transient value given to consent sinks
//! - **[`SessionKey`]**: Partitions sessions by provider and caller identity
//! - **[`AuthError`]**: The error taxonomy surfaced by `obtain_token`
//!
//! ## Example
//!
//! ```rust
//! use agentauth_core::{AuthSession, PendingAuth, SessionState};
//! use url::Url;
//!
//! let pending = PendingAuth::new(
//!     "sess-1",
//!     Url::parse("https://github.com/login/oauth/authorize?state=x").unwrap(),
//! );
//! let session = AuthSession::from_pending(pending);
//!
//! assert_eq!(session.state, SessionState::Pending);
//! assert!(!session.notified);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod errors;
pub mod identifier;
pub mod session;
pub mod token;

pub use errors::{AuthError, Result};
pub use session::{AuthSession, SessionKey, SessionState};
pub use token::{ConsentNotification, PendingAuth, Scopes, TokenResult};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        AuthError, AuthSession, ConsentNotification, PendingAuth, Result, Scopes, SessionKey,
        SessionState, TokenResult,
    };
}
