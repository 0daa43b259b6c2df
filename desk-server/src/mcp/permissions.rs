//! Per-agent, per-tool authorization.
//!
//! Authorization keys off the `agent_id` argument supplied inside each
//! `tools/call` payload, never the session's bound agent id: each call is
//! authorized statelessly on its own.

use desk_core::{Database, Error, Result};
use std::sync::Arc;
use tracing::warn;

/// Namespace under which this server's tools are granted
pub const SERVER_NAMESPACE: &str = "support-server";

/// Result of resolving an agent against a tool name
#[derive(Debug, Clone)]
pub struct PermissionCheck {
    pub agent_name: String,
    pub allowed: bool,
}

/// Resolves whether an agent may invoke a tool, deny-by-default.
pub struct PermissionResolver {
    db: Arc<Database>,
    namespace: String,
}

impl PermissionResolver {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            namespace: SERVER_NAMESPACE.to_string(),
        }
    }

    /// Walk the authorization gates for one call.
    ///
    /// Unknown agent and missing permission record are hard errors. A known
    /// agent whose grant does not list the tool resolves to `allowed: false`
    /// so the caller can audit the denial with the agent's name attached.
    ///
    /// The grant's `enabled` flag is deliberately not consulted: membership
    /// in the namespace `tools` array is the only gate. See DESIGN.md.
    pub fn resolve(&self, agent_id: &str, tool_name: &str) -> Result<PermissionCheck> {
        let agent = self
            .db
            .get_agent(agent_id)?
            .ok_or_else(|| Error::AgentNotFound(agent_id.to_string()))?;

        let permissions = self
            .db
            .get_permissions(agent_id)?
            .ok_or_else(|| Error::NoPermissions(agent_id.to_string()))?;

        let allowed = permissions
            .get(&self.namespace)
            .map(|grant| grant.tools.iter().any(|t| t == tool_name))
            .unwrap_or(false);

        if !allowed {
            warn!(
                "agent {} ({}) denied for tool {}",
                agent_id, agent.name, tool_name
            );
        }

        Ok(PermissionCheck {
            agent_name: agent.name,
            allowed,
        })
    }
}
