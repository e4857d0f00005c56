//! Consent notification sinks.
//!
//! A [`ConsentNotifier`] is a dumb sink: it receives the consent URL and
//! displays, stores, or forwards it, returning immediately. Deciding *when*
//! to notify (at most once per session) is the flow controller's job, not
//! the sink's.

use std::sync::Arc;

use agentauth_core::ConsentNotification;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

/// Errors a sink may report. They never fail the auth flow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The receiving side of a channel is gone.
    #[error("Consent channel closed")]
    ChannelClosed,

    /// Any other delivery failure.
    #[error("Consent delivery failed: {0}")]
    Delivery(String),
}

/// Receives the consent URL for a session.
///
/// Must not block or suspend.
#[cfg_attr(test, mockall::automock)]
pub trait ConsentNotifier: Send + Sync {
    /// Deliver the notification.
    fn notify(&self, notification: &ConsentNotification) -> Result<(), NotifyError>;
}

impl<T: ConsentNotifier + ?Sized> ConsentNotifier for Arc<T> {
    fn notify(&self, notification: &ConsentNotification) -> Result<(), NotifyError> {
        (**self).notify(notification)
    }
}

impl<T: ConsentNotifier + ?Sized> ConsentNotifier for &T {
    fn notify(&self, notification: &ConsentNotification) -> Result<(), NotifyError> {
        (**self).notify(notification)
    }
}

/// Logs the consent URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl ConsentNotifier for TracingNotifier {
    fn notify(&self, notification: &ConsentNotification) -> Result<(), NotifyError> {
        info!(
            session_id = %notification.session_id,
            url = %notification.url,
            "Authorization required; open the consent URL to continue"
        );
        Ok(())
    }
}

/// Forwards notifications into a tokio channel, e.g. towards a UI task.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: UnboundedSender<ConsentNotification>,
}

impl ChannelNotifier {
    /// Wrap a sender.
    pub fn new(sender: UnboundedSender<ConsentNotification>) -> Self {
        Self { sender }
    }
}

impl ConsentNotifier for ChannelNotifier {
    fn notify(&self, notification: &ConsentNotification) -> Result<(), NotifyError> {
        self.sender
            .send(notification.clone())
            .map_err(|_| NotifyError::ChannelClosed)
    }
}

/// Closure-backed notifier.
pub struct FnNotifier<F> {
    function: F,
}

impl<F> FnNotifier<F>
where
    F: Fn(&ConsentNotification) -> Result<(), NotifyError> + Send + Sync,
{
    /// Wrap a closure.
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<F> ConsentNotifier for FnNotifier<F>
where
    F: Fn(&ConsentNotification) -> Result<(), NotifyError> + Send + Sync,
{
    fn notify(&self, notification: &ConsentNotification) -> Result<(), NotifyError> {
        (self.function)(notification)
    }
}

impl<F> std::fmt::Debug for FnNotifier<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnNotifier").finish_non_exhaustive()
    }
}

/// Keeps every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<ConsentNotification>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications so far.
    pub fn notifications(&self) -> Vec<ConsentNotification> {
        self.received.lock().clone()
    }

    /// Number of notifications so far.
    pub fn count(&self) -> usize {
        self.received.lock().len()
    }

    /// The most recent notification.
    pub fn last(&self) -> Option<ConsentNotification> {
        self.received.lock().last().cloned()
    }

    /// Drain and return everything recorded.
    pub fn take(&self) -> Vec<ConsentNotification> {
        std::mem::take(&mut *self.received.lock())
    }
}

impl ConsentNotifier for RecordingNotifier {
    fn notify(&self, notification: &ConsentNotification) -> Result<(), NotifyError> {
        self.received.lock().push(notification.clone());
        Ok(())
    }
}
