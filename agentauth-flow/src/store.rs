//! In-memory session store.

use std::collections::HashMap;

use agentauth_core::{AuthSession, ConsentNotification, PendingAuth, SessionKey};
use parking_lot::RwLock;

/// Pending consent sessions keyed by provider and caller.
///
/// Locks are held only for the duration of a map operation, never across
/// an await.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionKey, AuthSession>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the session for a key.
    pub fn get(&self, key: &SessionKey) -> Option<AuthSession> {
        self.sessions.read().get(key).cloned()
    }

    /// Insert or replace the session for a key.
    pub fn insert(&self, key: SessionKey, session: AuthSession) -> Option<AuthSession> {
        self.sessions.write().insert(key, session)
    }

    /// Get the session for a key, creating it from `pending` if absent, and
    /// take its consent notification if it has not been delivered yet.
    ///
    /// Runs under a single write lock so concurrent claims for the same key
    /// yield at most one notification.
    pub fn claim(
        &self,
        key: SessionKey,
        pending: PendingAuth,
    ) -> (AuthSession, Option<ConsentNotification>) {
        let mut sessions = self.sessions.write();
        let session = sessions
            .entry(key)
            .or_insert_with(|| AuthSession::from_pending(pending));
        let notification = session.take_notification();
        (session.clone(), notification)
    }

    /// Remove the session for a key.
    pub fn remove(&self, key: &SessionKey) -> Option<AuthSession> {
        self.sessions.write().remove(key)
    }

    /// Check whether a key has a session.
    pub fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.read().contains_key(key)
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Drop every session.
    pub fn clear(&self) {
        self.sessions.write().clear();
    }
}
