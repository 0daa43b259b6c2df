//! Shared domain types for the support desk.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ticket status reaches its terminal state at this value; the statistics
/// resolution rate is computed against it.
pub const STATUS_RESOLVED: &str = "Resolved";

/// Default cap on ticket listings when the caller supplies no limit
pub const DEFAULT_TICKET_LIMIT: u32 = 100;

/// A support ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub ticket_number: String,
    pub contact_id: Option<String>,
    pub subject: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub satisfaction_rating: Option<i64>,
    /// Unix timestamp (milliseconds)
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields for creating a new ticket
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub contact_id: Option<String>,
    pub subject: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

/// Partial field set for updating an existing ticket.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TicketUpdate {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub satisfaction_rating: Option<i64>,
}

impl TicketUpdate {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.satisfaction_rating.is_none()
    }
}

/// Composable ticket query filter. All set fields AND together.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// Exact status match
    pub status: Option<String>,
    /// Exact priority match
    pub priority: Option<String>,
    /// Case-insensitive substring match on category
    pub category: Option<String>,
    /// Restrict to tickets belonging to this contact
    pub contact_id: Option<String>,
    /// Inclusive lower bound on created_at (millis)
    pub created_after: Option<i64>,
    /// Inclusive upper bound on created_at (millis)
    pub created_before: Option<i64>,
    /// Result cap; no cap when `None`
    pub limit: Option<u32>,
}

/// A customer contact, keyed naturally by phone number
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: i64,
}

/// An external AI agent allowed to call tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

/// Per-namespace tool grant inside an agent's permission record.
///
/// Only membership in `tools` gates execution; `enabled` is carried on the
/// record but not consulted at enforcement time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolGrant {
    pub enabled: bool,
    pub tools: Vec<String>,
}

/// An agent's full permission record: server namespace -> grant
pub type PermissionSet = HashMap<String, ToolGrant>;

/// Outcome of a tool invocation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Denied,
    Error,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "Success",
            AuditOutcome::Denied => "Denied",
            AuditOutcome::Error => "Error",
        }
    }
}

/// Fields for appending one audit log row
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub agent_id: String,
    pub agent_name: String,
    pub module: String,
    pub action: String,
    pub result: AuditOutcome,
    pub user_context: Option<String>,
    pub details: Option<serde_json::Value>,
}

/// One immutable audit log row
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub module: String,
    pub action: String,
    pub result: String,
    pub user_context: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: i64,
}
