//! # agentauth-retries
//!
//! Bounded retries for identity broker calls.
//!
//! A single failed broker request should not end an authorization flow:
//! transient failures (timeouts, refused connections, 429 and 5xx answers)
//! are retried a small, fixed number of times before the caller sees them.
//! Non-transient failures, such as a 400 rejecting the requested scopes, are
//! returned immediately.
//!
//! ## Core Concepts
//!
//! - **[`RetryConfig`]**: How many retries, which errors, how long to wait
//! - **[`Backoff`]**: Fixed or capped exponential delay with jitter
//! - **[`with_retry`]**: Run an async broker call under a config
//!
//! ## Example
//!
//! ```ignore
//! use agentauth_retries::{with_retry, RetryConfig, RetryableError};
//! use std::time::Duration;
//!
//! let config = RetryConfig::new()
//!     .max_retries(2)
//!     .fixed(Duration::from_millis(200));
//!
//! let result = with_retry(&config, || async {
//!     Ok::<_, RetryableError>("ready")
//! }).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod executor;

pub use config::{Backoff, RetryConfig};
pub use error::{RetryResult, RetryableError};
pub use executor::{with_retry, with_retry_report, RetryReport};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{with_retry, Backoff, RetryConfig, RetryResult, RetryableError};
}
