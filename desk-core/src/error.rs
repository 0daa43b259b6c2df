//! Error types for desk-core.

use thiserror::Error;

/// Result type alias using desk-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for support desk operations
#[derive(Error, Debug)]
pub enum Error {
    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    // Protocol errors
    #[error("Unknown method: {0}")]
    MethodNotFound(String),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Missing required parameter: {0}")]
    MissingParam(&'static str),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },

    // Authorization errors
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Agent {0} has no permissions set")]
    NoPermissions(String),

    #[error("Agent {agent} does not have permission to use tool {tool}")]
    PermissionDenied { agent: String, tool: String },

    // Domain errors
    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid-parameter error
    pub fn invalid_param(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            name,
            reason: reason.into(),
        }
    }
}
