//! Session registry — maps session ids to their chat sessions.
//!
//! Each session sits behind its own async mutex; holding it for the whole
//! query gives at most one in-flight generation per session. Sessions share
//! nothing else.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::Mutex as AsyncMutex;
use tracing::info;
use uuid::Uuid;

use crate::assistant::session::ChatSession;

pub type SessionHandle = Arc<AsyncMutex<ChatSession>>;

struct Entry {
    session: SessionHandle,
    last_used: Instant,
}

pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Starts a fresh session, evicting the least recently used one when full.
    pub fn create(&self) -> (Uuid, SessionHandle) {
        let id = Uuid::new_v4();
        let handle = Arc::new(AsyncMutex::new(ChatSession::new(id)));

        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| *id)
            else {
                break;
            };
            sessions.remove(&oldest);
            info!("Evicted idle session {oldest}");
        }
        sessions.insert(
            id,
            Entry {
                session: handle.clone(),
                last_used: Instant::now(),
            },
        );

        (id, handle)
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get_mut(id).map(|entry| {
            entry.last_used = Instant::now();
            entry.session.clone()
        })
    }

    /// Drops a session. Returns false when it did not exist.
    pub fn remove(&self, id: &Uuid) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
