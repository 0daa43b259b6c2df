//! Application state.

use desk_core::Database;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::mcp::McpDispatcher;
use crate::session::SessionRegistry;

/// Shared application state
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Database connection
    pub db: Arc<Database>,
    /// Per-connection session registry
    pub sessions: Arc<SessionRegistry>,
    /// MCP request dispatcher
    pub dispatcher: McpDispatcher,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, db: Database) -> Arc<Self> {
        let db = Arc::new(db);
        let sessions = Arc::new(SessionRegistry::new());
        Arc::new(Self {
            config: Arc::new(config),
            dispatcher: McpDispatcher::new(Arc::clone(&db), Arc::clone(&sessions)),
            db,
            sessions,
            start_time: Instant::now(),
        })
    }
}
