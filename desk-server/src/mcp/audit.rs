//! Audit logging for tool invocations.
//!
//! One immutable row per `tools/call` attempt, written before the response is
//! constructed so a failure later in the cycle still leaves a trail.

use desk_core::types::{AuditOutcome, NewAuditEntry};
use desk_core::{Database, Result};
use serde_json::{json, Value};
use std::sync::Arc;

/// The tools' functional domain, recorded on every entry
const AUDIT_MODULE: &str = "support";

pub struct AuditLogger {
    db: Arc<Database>,
}

impl AuditLogger {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Record a successful invocation with an input/output summary
    pub fn success(
        &self,
        agent_id: &str,
        agent_name: &str,
        action: &str,
        user_context: Option<&str>,
        args: &Value,
        output: &Value,
    ) -> Result<()> {
        self.write(
            agent_id,
            agent_name,
            action,
            AuditOutcome::Success,
            user_context,
            json!({
                "arguments": scrub_args(args),
                "output": summarize_output(output),
            }),
        )
    }

    /// Record a permission denial
    pub fn denied(
        &self,
        agent_id: &str,
        agent_name: &str,
        action: &str,
        user_context: Option<&str>,
        reason: &str,
    ) -> Result<()> {
        self.write(
            agent_id,
            agent_name,
            action,
            AuditOutcome::Denied,
            user_context,
            json!({ "reason": reason }),
        )
    }

    /// Record a handler failure
    pub fn error(
        &self,
        agent_id: &str,
        agent_name: &str,
        action: &str,
        user_context: Option<&str>,
        message: &str,
    ) -> Result<()> {
        self.write(
            agent_id,
            agent_name,
            action,
            AuditOutcome::Error,
            user_context,
            json!({ "error": message }),
        )
    }

    fn write(
        &self,
        agent_id: &str,
        agent_name: &str,
        action: &str,
        result: AuditOutcome,
        user_context: Option<&str>,
        details: Value,
    ) -> Result<()> {
        self.db.insert_audit_entry(&NewAuditEntry {
            agent_id: agent_id.to_string(),
            agent_name: agent_name.to_string(),
            module: AUDIT_MODULE.to_string(),
            action: action.to_string(),
            result,
            user_context: user_context.map(String::from),
            details: Some(details),
        })
    }
}

/// Business arguments only: authorization and audit metadata are not inputs
fn scrub_args(args: &Value) -> Value {
    match args {
        Value::Object(map) => {
            let filtered: serde_json::Map<String, Value> = map
                .iter()
                .filter(|(k, _)| k.as_str() != "agent_id" && k.as_str() != "phone_number")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Value::Object(filtered)
        }
        other => other.clone(),
    }
}

/// Compact view of a tool's output: result cardinality or identifying key
/// instead of full row payloads.
fn summarize_output(output: &Value) -> Value {
    let mut summary = serde_json::Map::new();
    if let Some(count) = output.get("count") {
        summary.insert("count".to_string(), count.clone());
    }
    if let Some(deleted) = output.get("deleted") {
        summary.insert("deleted".to_string(), deleted.clone());
    }
    if let Some(number) = output
        .get("ticket")
        .and_then(|t| t.get("ticketNumber"))
        .or_else(|| output.get("ticket_number"))
    {
        summary.insert("ticket_number".to_string(), number.clone());
    }
    if let Some(total) = output.get("stats").and_then(|s| s.get("total")) {
        summary.insert("total".to_string(), total.clone());
    }
    Value::Object(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrub_removes_metadata_fields() {
        let args = json!({
            "agent_id": "a1",
            "phone_number": "+1555",
            "status": "Open",
        });
        let scrubbed = scrub_args(&args);
        assert!(scrubbed.get("agent_id").is_none());
        assert!(scrubbed.get("phone_number").is_none());
        assert_eq!(scrubbed["status"], "Open");
    }

    #[test]
    fn test_summarize_prefers_cardinality_and_keys() {
        let listing = json!({"success": true, "count": 4, "tickets": [1, 2, 3, 4]});
        let summary = summarize_output(&listing);
        assert_eq!(summary["count"], 4);
        assert!(summary.get("tickets").is_none());

        let created = json!({"success": true, "ticket": {"ticketNumber": "TKT-AB12CD34"}});
        let summary = summarize_output(&created);
        assert_eq!(summary["ticket_number"], "TKT-AB12CD34");
    }

    #[test]
    fn test_entries_written_per_outcome() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.init_schema().unwrap();
        let logger = AuditLogger::new(Arc::clone(&db));

        logger
            .success("a1", "Bot", "get_support_tickets", None, &json!({}), &json!({"count": 0}))
            .unwrap();
        logger
            .denied("a1", "Bot", "delete_support_ticket", Some("+1555"), "not allowed")
            .unwrap();
        logger
            .error("a1", "Bot", "create_support_ticket", None, "db unavailable")
            .unwrap();

        let entries = db.list_audit_entries("a1").unwrap();
        assert_eq!(entries.len(), 3);
        let results: Vec<&str> = entries.iter().map(|e| e.result.as_str()).collect();
        assert!(results.contains(&"Success"));
        assert!(results.contains(&"Denied"));
        assert!(results.contains(&"Error"));
    }
}
