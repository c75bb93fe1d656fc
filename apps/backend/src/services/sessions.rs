//! Active review sessions, one per learner.
//!
//! Starting a session replaces any session the learner already had, so a
//! learner's working set is never driven by two runners at once. Each
//! session sits behind its own async lock so an answer can hold it across
//! the database write. Sessions left untouched past the idle timeout are
//! swept on the next start or lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use progress_core::SessionRunner;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

/// Handle to one learner's running session.
pub type SharedSession = Arc<AsyncMutex<SessionRunner>>;

#[derive(Debug)]
struct Entry {
    session: SharedSession,
    last_touched: Instant,
}

#[derive(Debug)]
pub struct SessionStore {
    idle_timeout: Duration,
    sessions: Mutex<HashMap<Uuid, Entry>>,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Install a session for the learner, replacing any earlier one.
    pub fn start(&self, learner_id: Uuid, runner: SessionRunner, now: Instant) -> SharedSession {
        let mut sessions = self.lock();
        self.sweep(&mut sessions, now);

        let session = Arc::new(AsyncMutex::new(runner));
        let entry = Entry {
            session: Arc::clone(&session),
            last_touched: now,
        };
        if sessions.insert(learner_id, entry).is_some() {
            tracing::info!(%learner_id, "replacing active review session");
        }
        tracing::debug!(active = sessions.len(), "review session stored");

        session
    }

    /// Look up the learner's session and mark it as used.
    pub fn get(&self, learner_id: Uuid, now: Instant) -> Option<SharedSession> {
        let mut sessions = self.lock();
        self.sweep(&mut sessions, now);

        let entry = sessions.get_mut(&learner_id)?;
        entry.last_touched = now;
        Some(Arc::clone(&entry.session))
    }

    /// Remove and return the learner's session.
    pub fn end(&self, learner_id: Uuid) -> Option<SharedSession> {
        self.lock().remove(&learner_id).map(|entry| entry.session)
    }

    fn sweep(&self, sessions: &mut HashMap<Uuid, Entry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_touched) < self.idle_timeout);

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, active = sessions.len(), "dropped idle review sessions");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn active_count(&self) -> usize {
        self.lock().len()
    }
}
