/*!
Keyed store isolating concurrent simulation runs.

Each connected client owns one session. The map itself sits behind an
`RwLock`; each session's state sits behind its own `Mutex`, so a session
processes at most one in-flight step at a time while unrelated sessions run
fully in parallel. Idle sessions are evicted by a caller-driven TTL sweep.
*/

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use rand::{Rng, rng};

use crate::core::constants::SESSION_ID_BYTES;
use crate::core::error::{Result, StateError};
use crate::session::state::SessionState;

/// Opaque session identifier, issued as a random hex token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Issue a fresh random identifier.
    pub fn generate() -> Self {
        let mut rng = rng();
        let mut token = String::with_capacity(SESSION_ID_BYTES * 2);
        for _ in 0..SESSION_ID_BYTES {
            let byte: u8 = rng.random();
            token.push_str(&format!("{byte:02x}"));
        }
        Self(token)
    }

    /// Wrap an externally supplied identifier (e.g. a cookie value).
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Entry {
    state: SessionState,
    touched_at: Instant,
}

/// Expiring map from session identifier to session state.
///
/// An injected dependency of the API layer, never a process-wide singleton.
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Entry>>>>,
}

impl SessionStore {
    /// Create a store with the given idle lifetime.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Install (or replace) the state for a session.
    pub fn insert(&self, id: SessionId, state: SessionState) {
        let entry = Arc::new(Mutex::new(Entry {
            state,
            touched_at: Instant::now(),
        }));
        self.write_map().insert(id, entry);
    }

    /// Run one protocol step against a session's state.
    ///
    /// The closure executes under the session's own mutex, so steps for one
    /// session never interleave. A missing or expired session yields
    /// [`StateError::UnknownSession`]; an expired session is removed on
    /// discovery.
    pub fn with_session<T>(
        &self,
        id: &SessionId,
        step: impl FnOnce(&mut SessionState) -> Result<T>,
    ) -> Result<T> {
        let entry = {
            let map = self.read_map();
            map.get(id).cloned()
        };
        let Some(entry) = entry else {
            return Err(StateError::UnknownSession.into());
        };

        let mut guard = lock_entry(&entry);
        if guard.touched_at.elapsed() > self.ttl {
            drop(guard);
            self.remove(id);
            log::debug!("session {id} expired");
            return Err(StateError::UnknownSession.into());
        }

        let result = step(&mut guard.state);
        if result.is_ok() {
            guard.touched_at = Instant::now();
        }
        result
    }

    /// Remove a session outright. Returns whether it existed.
    pub fn remove(&self, id: &SessionId) -> bool {
        self.write_map().remove(id).is_some()
    }

    /// Sweep out every session idle longer than the TTL. Returns the number
    /// evicted.
    pub fn evict_expired(&self) -> usize {
        let mut map = self.write_map();
        let before = map.len();
        map.retain(|_, entry| lock_entry(entry).touched_at.elapsed() <= self.ttl);
        let evicted = before - map.len();
        if evicted > 0 {
            log::info!("evicted {evicted} expired sessions");
        }
        evicted
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.read_map().is_empty()
    }

    fn read_map(&self) -> RwLockReadGuard<'_, HashMap<SessionId, Arc<Mutex<Entry>>>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, Arc<Mutex<Entry>>>> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// A panic inside one step poisons only that session's mutex; recovering the
// guard keeps the rest of the store usable.
fn lock_entry(entry: &Mutex<Entry>) -> MutexGuard<'_, Entry> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}
