//! Shared storage for live editing sessions.
//!
//! Provides a thread-safe [`SessionStore`] so HTTP handlers can reach the
//! editing session a page shell opened earlier. Sessions that go unused for
//! longer than the idle timeout are torn down and dropped.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CanvasError, CanvasResult, EditingSession, History};

/// Default cap on concurrently open sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 256;

/// Default time a session may sit unused before it is evicted.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Identifier of an editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CanvasError::SessionNotFound(s.to_string()))
    }
}

/// Entry in the session store.
#[derive(Debug)]
struct StoredSession {
    session: EditingSession,
    /// Last time the session was created or accessed.
    last_accessed: Instant,
}

/// Thread-safe map of open editing sessions.
///
/// Each session owns its own [`History`]; nothing is shared between them.
/// Timestamps use [`Instant`], so the store is meant for native hosts.
///
/// # Example
///
/// ```
/// use wallpaper_core::store::SessionStore;
/// use wallpaper_core::ToolAction;
///
/// let store = SessionStore::new();
/// let id = store.create(800.0, 600.0).unwrap();
/// store
///     .with_session(id, |session| session.dispatch(ToolAction::AddText))
///     .unwrap();
/// assert_eq!(store.count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, StoredSession>>>,
    max_sessions: usize,
    idle_timeout: Option<Duration>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create an empty store with the default session cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_sessions(DEFAULT_MAX_SESSIONS)
    }

    /// Create an empty store holding at most `max_sessions` sessions.
    #[must_use]
    pub fn with_max_sessions(max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_sessions: max_sessions.max(1),
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
        }
    }

    /// Evict sessions unused for longer than `timeout`; `None` keeps them
    /// until removed.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Open a session on an empty surface.
    ///
    /// Idle sessions are evicted first, so abandoned sessions never hold
    /// the store at its limit.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SessionLimit`] when the store is full.
    pub fn create(&self, width: f32, height: f32) -> CanvasResult<SessionId> {
        self.create_with_history(width, height, History::new())
    }

    /// Open a session recording into the given history.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SessionLimit`] when the store is full.
    pub fn create_with_history(
        &self,
        width: f32,
        height: f32,
        history: History,
    ) -> CanvasResult<SessionId> {
        let now = Instant::now();
        let (id, evicted) = {
            let mut sessions = self
                .sessions
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let evicted = self.take_idle(&mut sessions, now);
            if sessions.len() >= self.max_sessions {
                drop(sessions);
                teardown_all(evicted);
                return Err(CanvasError::SessionLimit(self.max_sessions));
            }
            let session =
                EditingSession::with_history(crate::Scene::new(width, height), history)?;
            let id = SessionId::new();
            sessions.insert(
                id,
                StoredSession {
                    session,
                    last_accessed: now,
                },
            );
            tracing::debug!(session = %id, open = sessions.len(), "session created");
            (id, evicted)
        };
        teardown_all(evicted);
        Ok(id)
    }

    /// Run `f` against a session.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SessionNotFound`] for unknown IDs, or whatever
    /// `f` returns.
    pub fn with_session<F, R>(&self, id: SessionId, f: F) -> CanvasResult<R>
    where
        F: FnOnce(&mut EditingSession) -> CanvasResult<R>,
    {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| CanvasError::SessionNotFound(id.to_string()))?;
        entry.last_accessed = Instant::now();
        f(&mut entry.session)
    }

    /// Tear down and drop a session.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SessionNotFound`] for unknown IDs.
    pub fn remove(&self, id: SessionId) -> CanvasResult<()> {
        let mut entry = {
            let mut sessions = self
                .sessions
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            sessions
                .remove(&id)
                .ok_or_else(|| CanvasError::SessionNotFound(id.to_string()))?
        };
        entry.session.teardown();
        Ok(())
    }

    /// Tear down and drop every session idle for longer than the timeout.
    /// Returns how many were evicted.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    /// [`evict_idle`](Self::evict_idle) against an explicit clock.
    pub fn evict_idle_at(&self, now: Instant) -> usize {
        let evicted = {
            let mut sessions = self
                .sessions
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            self.take_idle(&mut sessions, now)
        };
        let count = evicted.len();
        teardown_all(evicted);
        count
    }

    fn take_idle(
        &self,
        sessions: &mut HashMap<SessionId, StoredSession>,
        now: Instant,
    ) -> Vec<(SessionId, StoredSession)> {
        let Some(timeout) = self.idle_timeout else {
            return Vec::new();
        };
        let expired: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_accessed) > timeout)
            .map(|(id, _)| *id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| sessions.remove(&id).map(|entry| (id, entry)))
            .collect()
    }

    /// Whether a session exists.
    #[must_use]
    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Number of open sessions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Session cap.
    #[must_use]
    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Idle timeout, if eviction is enabled.
    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }
}

fn teardown_all(evicted: Vec<(SessionId, StoredSession)>) {
    for (id, mut entry) in evicted {
        entry.session.teardown();
        tracing::info!(session = %id, "idle session evicted");
    }
}
