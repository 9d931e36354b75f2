//! Engine-wide session registry
//!
//! Maps session ids to live sessions. Creation, lookup and removal are
//! atomic with respect to each other, so an id is never handed out twice
//! and a torn-down session is unreachable before its resources are freed.

use super::session::Session;
use bytes::Bytes;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// Registry of live sessions
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    shutdown: CancellationToken,
}

impl SessionRegistry {
    /// Create an empty registry
    ///
    /// Sessions get child tokens of `shutdown`, so cancelling it stops every
    /// session's network task.
    #[must_use]
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            shutdown,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Session>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create and register a new session under a fresh id
    pub fn create(&self) -> Arc<Session> {
        let mut sessions = self.lock();
        let id = loop {
            let candidate = generate_session_id();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = Arc::new(Session::new(id.clone(), self.shutdown.child_token()));
        sessions.insert(id.clone(), session.clone());
        tracing::debug!(session = %id, total = sessions.len(), "Session registered");
        session
    }

    /// Look up a live session
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.lock().get(id).cloned()
    }

    /// Check whether an id is registered
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    /// Remove a session without closing it
    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.lock().remove(id)
    }

    /// Remove and close a session
    ///
    /// Returns `false` if the id was not registered.
    pub fn teardown(&self, id: &str) -> bool {
        match self.remove(id) {
            Some(session) => {
                session.close();
                true
            }
            None => false,
        }
    }

    /// Feed decoded audio to a session
    ///
    /// Returns `false` when the session is unknown or not streaming.
    pub fn ingest(&self, id: &str, chunk: Bytes) -> bool {
        self.get(id).is_some_and(|session| session.ingest(chunk))
    }

    /// Ids of all live sessions
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no session is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Close and remove every session; returns how many were closed
    pub fn shutdown(&self) -> usize {
        let drained: Vec<_> = self.lock().drain().map(|(_, session)| session).collect();
        let count = drained.len();
        for session in drained {
            session.close();
        }
        count
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .finish()
    }
}

/// 16 uppercase hex characters
pub(crate) fn generate_session_id() -> String {
    format!("{:016X}", rand::thread_rng().r#gen::<u64>())
}
