//! Per-connection session registry.
//!
//! Sessions carry two scalar fields and are never evicted; a long-lived
//! process accumulates one entry per distinct session id. The registry is an
//! injected store rather than a process global so ownership and lifetime are
//! explicit.

use std::collections::HashMap;
use tokio::sync::RwLock;

/// Ephemeral per-session state
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Has `initialize` been called on this session
    pub initialized: bool,
    /// Agent identity supplied at initialization. Informational only:
    /// authorization keys off the per-call `agent_id` argument instead.
    pub agent_id: Option<String>,
}

/// Concurrent-safe session store keyed by opaque session id
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a fresh collision-resistant session id
    pub fn new_session_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Mark a session initialized, binding the client-supplied agent id.
    ///
    /// Idempotent: re-initializing simply overwrites the record.
    pub async fn initialize(&self, session_id: &str, agent_id: Option<String>) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            session_id.to_string(),
            Session {
                initialized: true,
                agent_id,
            },
        );
    }

    /// Look up a session by id
    pub async fn get(&self, session_id: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Number of tracked sessions
    pub async fn len(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}
