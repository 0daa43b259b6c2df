//! Direct SQLite access for the support desk.
//!
//! The dispatcher treats this as its Data Store collaborator: narrow
//! select/insert/update/delete operations with structured errors. Schema is
//! bootstrapped via [`Database::init_schema`].

use crate::error::{Error, Result};
use crate::types::{
    Agent, AuditEntry, Contact, NewAuditEntry, NewTicket, PermissionSet, Ticket, TicketFilter,
    TicketUpdate,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, ToSql};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Database connection wrapper.
///
/// Thread-safe via internal Mutex. All database operations acquire the lock.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open database at specific path
    pub fn open_path(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(Error::Database)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (tests)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Error::Database)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create tables if they do not exist
    pub fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS contacts (
                 id TEXT PRIMARY KEY,
                 name TEXT NOT NULL,
                 email TEXT,
                 phone TEXT,
                 created_at INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS support_tickets (
                 id TEXT PRIMARY KEY,
                 ticket_number TEXT NOT NULL UNIQUE,
                 contact_id TEXT REFERENCES contacts(id),
                 subject TEXT NOT NULL,
                 description TEXT,
                 status TEXT NOT NULL DEFAULT 'Open',
                 priority TEXT,
                 category TEXT,
                 satisfaction_rating INTEGER,
                 created_at INTEGER NOT NULL,
                 updated_at INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS agents (
                 id TEXT PRIMARY KEY,
                 name TEXT NOT NULL,
                 created_at INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS agent_permissions (
                 agent_id TEXT PRIMARY KEY REFERENCES agents(id),
                 permissions TEXT NOT NULL,
                 updated_at INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS audit_log (
                 id TEXT PRIMARY KEY,
                 agent_id TEXT NOT NULL,
                 agent_name TEXT NOT NULL,
                 module TEXT NOT NULL,
                 action TEXT NOT NULL,
                 result TEXT NOT NULL,
                 user_context TEXT,
                 details TEXT,
                 created_at INTEGER NOT NULL
             );",
        )?;
        Ok(())
    }

    /// Check database connectivity
    pub fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        conn.execute_batch("SELECT 1").map_err(Error::Database)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ticket Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// List tickets matching a filter, most recent first.
    ///
    /// All set filter fields AND together. The limit is applied only when the
    /// filter carries one; callers that expose this to agents supply a cap.
    pub fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;

        let mut sql = String::from(
            "SELECT id, ticket_number, contact_id, subject, description, status,
                    priority, category, satisfaction_rating, created_at, updated_at
             FROM support_tickets WHERE 1=1",
        );
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(status) = &filter.status {
            sql.push_str(" AND status = ?");
            values.push(Box::new(status.clone()));
        }
        if let Some(priority) = &filter.priority {
            sql.push_str(" AND priority = ?");
            values.push(Box::new(priority.clone()));
        }
        if let Some(category) = &filter.category {
            sql.push_str(" AND LOWER(category) LIKE ?");
            values.push(Box::new(format!("%{}%", category.to_lowercase())));
        }
        if let Some(contact_id) = &filter.contact_id {
            sql.push_str(" AND contact_id = ?");
            values.push(Box::new(contact_id.clone()));
        }
        if let Some(after) = filter.created_after {
            sql.push_str(" AND created_at >= ?");
            values.push(Box::new(after));
        }
        if let Some(before) = filter.created_before {
            sql.push_str(" AND created_at <= ?");
            values.push(Box::new(before));
        }

        sql.push_str(" ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            values.push(Box::new(limit as i64));
        }

        let mut stmt = conn.prepare(&sql)?;
        let tickets = stmt
            .query_map(
                params_from_iter(values.iter().map(|v| v.as_ref())),
                Self::map_ticket,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("list_tickets: {} rows", tickets.len());
        Ok(tickets)
    }

    /// Get ticket by ticket number
    pub fn get_ticket(&self, ticket_number: &str) -> Result<Option<Ticket>> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT id, ticket_number, contact_id, subject, description, status,
                    priority, category, satisfaction_rating, created_at, updated_at
             FROM support_tickets WHERE ticket_number = ?1",
        )?;
        Ok(stmt
            .query_row(params![ticket_number], Self::map_ticket)
            .optional()?)
    }

    fn map_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        Ok(Ticket {
            id: row.get(0)?,
            ticket_number: row.get(1)?,
            contact_id: row.get(2)?,
            subject: row.get(3)?,
            description: row.get(4)?,
            status: row.get(5)?,
            priority: row.get(6)?,
            category: row.get(7)?,
            satisfaction_rating: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    /// Create a new ticket, returning the stored row
    pub fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let id = uuid::Uuid::new_v4().to_string();
        let ticket_number = Self::new_ticket_number();
        let now = chrono::Utc::now().timestamp_millis();

        conn.execute(
            "INSERT INTO support_tickets
             (id, ticket_number, contact_id, subject, description, status,
              priority, category, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'Open', ?6, ?7, ?8, ?8)",
            params![
                id,
                ticket_number,
                ticket.contact_id,
                ticket.subject,
                ticket.description,
                ticket.priority,
                ticket.category,
                now,
            ],
        )?;

        Ok(Ticket {
            id,
            ticket_number,
            contact_id: ticket.contact_id.clone(),
            subject: ticket.subject.clone(),
            description: ticket.description.clone(),
            status: "Open".to_string(),
            priority: ticket.priority.clone(),
            category: ticket.category.clone(),
            satisfaction_rating: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn new_ticket_number() -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("TKT-{}", &suffix[..8].to_uppercase())
    }

    /// Apply a partial update by ticket number, returning the post-update row
    pub fn update_ticket(
        &self,
        ticket_number: &str,
        update: &TicketUpdate,
    ) -> Result<Option<Ticket>> {
        if !update.is_empty() {
            let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
            let now = chrono::Utc::now().timestamp_millis();

            let mut sql = String::from("UPDATE support_tickets SET updated_at = ?");
            let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(now)];

            if let Some(subject) = &update.subject {
                sql.push_str(", subject = ?");
                values.push(Box::new(subject.clone()));
            }
            if let Some(description) = &update.description {
                sql.push_str(", description = ?");
                values.push(Box::new(description.clone()));
            }
            if let Some(status) = &update.status {
                sql.push_str(", status = ?");
                values.push(Box::new(status.clone()));
            }
            if let Some(priority) = &update.priority {
                sql.push_str(", priority = ?");
                values.push(Box::new(priority.clone()));
            }
            if let Some(category) = &update.category {
                sql.push_str(", category = ?");
                values.push(Box::new(category.clone()));
            }
            if let Some(rating) = update.satisfaction_rating {
                sql.push_str(", satisfaction_rating = ?");
                values.push(Box::new(rating));
            }

            sql.push_str(" WHERE ticket_number = ?");
            values.push(Box::new(ticket_number.to_string()));

            conn.execute(&sql, params_from_iter(values.iter().map(|v| v.as_ref())))?;
        }
        self.get_ticket(ticket_number)
    }

    /// Delete a ticket by ticket number.
    ///
    /// Delete-if-exists semantics: returns the number of rows removed, zero
    /// included.
    pub fn delete_ticket(&self, ticket_number: &str) -> Result<usize> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let rows = conn.execute(
            "DELETE FROM support_tickets WHERE ticket_number = ?1",
            params![ticket_number],
        )?;
        Ok(rows)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Contact Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get contact by phone number
    pub fn get_contact_by_phone(&self, phone: &str) -> Result<Option<Contact>> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT id, name, email, phone, created_at FROM contacts WHERE phone = ?1",
        )?;
        Ok(stmt.query_row(params![phone], Self::map_contact).optional()?)
    }

    /// Get contact by email
    pub fn get_contact_by_email(&self, email: &str) -> Result<Option<Contact>> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT id, name, email, phone, created_at FROM contacts WHERE email = ?1",
        )?;
        Ok(stmt.query_row(params![email], Self::map_contact).optional()?)
    }

    fn map_contact(row: &rusqlite::Row) -> rusqlite::Result<Contact> {
        Ok(Contact {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    /// Create a new contact
    pub fn create_contact(
        &self,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Contact> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO contacts (id, name, email, phone, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, name, email, phone, now],
        )?;
        Ok(Contact {
            id,
            name: name.to_string(),
            email: email.map(String::from),
            phone: phone.map(String::from),
            created_at: now,
        })
    }

    /// Look up a contact by phone number, creating one when absent.
    ///
    /// Known race: the lookup and insert are not one transaction, so two
    /// near-simultaneous calls with the same phone number can both insert.
    /// Uniqueness is not a contract here.
    pub fn find_or_create_contact_by_phone(&self, phone: &str, name: &str) -> Result<Contact> {
        if let Some(contact) = self.get_contact_by_phone(phone)? {
            return Ok(contact);
        }
        self.create_contact(name, None, Some(phone))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Agent & Permission Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get agent by ID
    pub fn get_agent(&self, agent_id: &str) -> Result<Option<Agent>> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let mut stmt = conn.prepare("SELECT id, name, created_at FROM agents WHERE id = ?1")?;
        Ok(stmt
            .query_row(params![agent_id], |row| {
                Ok(Agent {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })
            .optional()?)
    }

    /// Register an agent
    pub fn create_agent(&self, agent_id: &str, name: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let now = chrono::Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO agents (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![agent_id, name, now],
        )?;
        Ok(())
    }

    /// Get an agent's permission record (namespace -> grant)
    pub fn get_permissions(&self, agent_id: &str) -> Result<Option<PermissionSet>> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT permissions FROM agent_permissions WHERE agent_id = ?1",
                params![agent_id],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Set (replace) an agent's permission record
    pub fn set_permissions(&self, agent_id: &str, permissions: &PermissionSet) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let now = chrono::Utc::now().timestamp_millis();
        let json = serde_json::to_string(permissions)?;
        conn.execute(
            "INSERT INTO agent_permissions (agent_id, permissions, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(agent_id) DO UPDATE SET permissions = ?2, updated_at = ?3",
            params![agent_id, json, now],
        )?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Audit Log Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append one audit log row. Rows are never updated or deleted.
    pub fn insert_audit_entry(&self, entry: &NewAuditEntry) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp_millis();
        let details = entry
            .details
            .as_ref()
            .map(|d| serde_json::to_string(d))
            .transpose()?;
        conn.execute(
            "INSERT INTO audit_log
             (id, agent_id, agent_name, module, action, result, user_context, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                entry.agent_id,
                entry.agent_name,
                entry.module,
                entry.action,
                entry.result.as_str(),
                entry.user_context,
                details,
                now,
            ],
        )?;
        Ok(())
    }

    /// List audit entries for an agent, most recent first
    pub fn list_audit_entries(&self, agent_id: &str) -> Result<Vec<AuditEntry>> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT id, agent_id, agent_name, module, action, result, user_context,
                    details, created_at
             FROM audit_log WHERE agent_id = ?1
             ORDER BY created_at DESC",
        )?;
        let entries = stmt
            .query_map(params![agent_id], |row| {
                let details_raw: Option<String> = row.get(7)?;
                Ok((
                    AuditEntry {
                        id: row.get(0)?,
                        agent_id: row.get(1)?,
                        agent_name: row.get(2)?,
                        module: row.get(3)?,
                        action: row.get(4)?,
                        result: row.get(5)?,
                        user_context: row.get(6)?,
                        details: None,
                        created_at: row.get(8)?,
                    },
                    details_raw,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        entries
            .into_iter()
            .map(|(mut entry, raw)| {
                if let Some(raw) = raw {
                    entry.details = Some(serde_json::from_str(&raw)?);
                }
                Ok(entry)
            })
            .collect()
    }

    /// Count audit entries (health/inspection)
    pub fn count_audit_entries(&self) -> Result<u32> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let count: u32 = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuditOutcome;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.init_schema().unwrap();
        db
    }

    #[test]
    fn test_create_and_get_ticket() {
        let db = test_db();
        let created = db
            .create_ticket(&NewTicket {
                subject: "Printer on fire".to_string(),
                priority: Some("High".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert!(created.ticket_number.starts_with("TKT-"));
        assert_eq!(created.status, "Open");

        let fetched = db.get_ticket(&created.ticket_number).unwrap().unwrap();
        assert_eq!(fetched.subject, "Printer on fire");
        assert_eq!(fetched.priority.as_deref(), Some("High"));
    }

    #[test]
    fn test_open_path_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.db");

        let db = Database::open_path(&path).unwrap();
        db.init_schema().unwrap();
        let created = db
            .create_ticket(&NewTicket {
                subject: "Survives reopen".to_string(),
                ..Default::default()
            })
            .unwrap();
        drop(db);

        let db = Database::open_path(&path).unwrap();
        db.init_schema().unwrap();
        let fetched = db.get_ticket(&created.ticket_number).unwrap().unwrap();
        assert_eq!(fetched.subject, "Survives reopen");
    }

    #[test]
    fn test_list_tickets_filters_and_together() {
        let db = test_db();
        for (status, priority) in [
            ("Open", "High"),
            ("Open", "Low"),
            ("Resolved", "High"),
            ("Open", "High"),
        ] {
            let t = db
                .create_ticket(&NewTicket {
                    subject: "s".to_string(),
                    priority: Some(priority.to_string()),
                    ..Default::default()
                })
                .unwrap();
            if status != "Open" {
                db.update_ticket(
                    &t.ticket_number,
                    &TicketUpdate {
                        status: Some(status.to_string()),
                        ..Default::default()
                    },
                )
                .unwrap();
            }
        }

        let both = db
            .list_tickets(&TicketFilter {
                status: Some("Open".to_string()),
                priority: Some("High".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(both.len(), 2);
        assert!(both.iter().all(|t| t.status == "Open"));
        assert!(both.iter().all(|t| t.priority.as_deref() == Some("High")));
    }

    #[test]
    fn test_list_tickets_category_substring_case_insensitive() {
        let db = test_db();
        db.create_ticket(&NewTicket {
            subject: "a".to_string(),
            category: Some("Billing Question".to_string()),
            ..Default::default()
        })
        .unwrap();
        db.create_ticket(&NewTicket {
            subject: "b".to_string(),
            category: Some("Hardware".to_string()),
            ..Default::default()
        })
        .unwrap();

        let matched = db
            .list_tickets(&TicketFilter {
                category: Some("billing".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].subject, "a");
    }

    #[test]
    fn test_list_tickets_limit() {
        let db = test_db();
        for i in 0..5 {
            db.create_ticket(&NewTicket {
                subject: format!("t{}", i),
                ..Default::default()
            })
            .unwrap();
        }
        let capped = db
            .list_tickets(&TicketFilter {
                limit: Some(3),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(capped.len(), 3);
    }

    #[test]
    fn test_update_ticket_partial() {
        let db = test_db();
        let t = db
            .create_ticket(&NewTicket {
                subject: "original".to_string(),
                priority: Some("Low".to_string()),
                ..Default::default()
            })
            .unwrap();

        let updated = db
            .update_ticket(
                &t.ticket_number,
                &TicketUpdate {
                    status: Some("Resolved".to_string()),
                    satisfaction_rating: Some(5),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        // Untouched fields survive, set fields apply
        assert_eq!(updated.subject, "original");
        assert_eq!(updated.priority.as_deref(), Some("Low"));
        assert_eq!(updated.status, "Resolved");
        assert_eq!(updated.satisfaction_rating, Some(5));
    }

    #[test]
    fn test_update_missing_ticket_returns_none() {
        let db = test_db();
        let result = db
            .update_ticket(
                "TKT-NOPE",
                &TicketUpdate {
                    status: Some("Resolved".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_delete_ticket_if_exists() {
        let db = test_db();
        let t = db
            .create_ticket(&NewTicket {
                subject: "doomed".to_string(),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(db.delete_ticket(&t.ticket_number).unwrap(), 1);
        // Deleting again is not an error
        assert_eq!(db.delete_ticket(&t.ticket_number).unwrap(), 0);
    }

    #[test]
    fn test_find_or_create_contact() {
        let db = test_db();
        let first = db
            .find_or_create_contact_by_phone("+15551234", "Alice")
            .unwrap();
        let second = db
            .find_or_create_contact_by_phone("+15551234", "Someone Else")
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Alice");
    }

    #[test]
    fn test_permissions_roundtrip() {
        let db = test_db();
        db.create_agent("agent-1", "Support Bot").unwrap();

        let mut perms = PermissionSet::new();
        perms.insert(
            "support-server".to_string(),
            crate::types::ToolGrant {
                enabled: true,
                tools: vec!["get_support_tickets".to_string()],
            },
        );
        db.set_permissions("agent-1", &perms).unwrap();

        let loaded = db.get_permissions("agent-1").unwrap().unwrap();
        let grant = loaded.get("support-server").unwrap();
        assert!(grant.enabled);
        assert_eq!(grant.tools, vec!["get_support_tickets"]);

        assert!(db.get_permissions("agent-2").unwrap().is_none());
    }

    #[test]
    fn test_audit_entries_append_only() {
        let db = test_db();
        db.insert_audit_entry(&NewAuditEntry {
            agent_id: "agent-1".to_string(),
            agent_name: "Support Bot".to_string(),
            module: "support".to_string(),
            action: "get_support_tickets".to_string(),
            result: AuditOutcome::Success,
            user_context: Some("+15551234".to_string()),
            details: Some(serde_json::json!({"count": 3})),
        })
        .unwrap();

        let entries = db.list_audit_entries("agent-1").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].result, "Success");
        assert_eq!(entries[0].action, "get_support_tickets");
        assert_eq!(entries[0].details.as_ref().unwrap()["count"], 3);
        assert_eq!(db.count_audit_entries().unwrap(), 1);
    }
}
