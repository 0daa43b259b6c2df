//! Support ticket tools.
//!
//! Every tool receives the raw `arguments` object from `tools/call`. The
//! `agent_id` and `phone_number` fields are authorization/audit metadata
//! consumed before dispatch; tools only read their business parameters, so
//! non-domain fields never reach the store.

use async_trait::async_trait;
use chrono::NaiveDate;
use desk_core::types::{NewTicket, TicketFilter, TicketUpdate, DEFAULT_TICKET_LIMIT};
use desk_core::{Error, Result, TicketStats};
use serde_json::{json, Value};
use tracing::debug;

use super::{SupportTool, ToolContext, ToolDescriptor};

fn opt_str(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(String::from)
}

fn req_str<'a>(args: &'a Value, key: &'static str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or(Error::MissingParam(key))
}

/// Result cap for listings. A limit that is absent, non-numeric or out of
/// `u32` range falls back to the default rather than wrapping.
fn parse_limit(args: &Value) -> u32 {
    args.get("limit")
        .and_then(Value::as_u64)
        .and_then(|l| u32::try_from(l).ok())
        .unwrap_or(DEFAULT_TICKET_LIMIT)
}

/// Parse a YYYY-MM-DD bound into millis. `end_of_day` makes the bound
/// inclusive on the upper end.
fn parse_day_bound(raw: &str, name: &'static str, end_of_day: bool) -> Result<i64> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| Error::invalid_param(name, format!("expected YYYY-MM-DD: {}", e)))?;
    let time = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    let time = time.ok_or_else(|| Error::invalid_param(name, "out of range"))?;
    Ok(time.and_utc().timestamp_millis())
}

// ─────────────────────────────────────────────────────────────────────────────
// get_support_tickets
// ─────────────────────────────────────────────────────────────────────────────

pub struct GetTicketsTool;

#[async_trait]
impl SupportTool for GetTicketsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "get_support_tickets".to_string(),
            description: "Search support tickets. All filters are optional and combine with \
                          AND. Returns the most recent matches first, capped at 100 unless a \
                          limit is given."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "agent_id": {
                        "type": "string",
                        "description": "ID of the calling agent (required for authorization)"
                    },
                    "phone_number": {
                        "type": "string",
                        "description": "End-user phone number for audit traceability"
                    },
                    "status": {
                        "type": "string",
                        "description": "Exact ticket status",
                        "enum": ["Open", "In Progress", "Resolved", "Closed"]
                    },
                    "priority": {
                        "type": "string",
                        "description": "Exact ticket priority",
                        "enum": ["Low", "Medium", "High", "Urgent"]
                    },
                    "category": {
                        "type": "string",
                        "description": "Case-insensitive substring match on the ticket category"
                    },
                    "customer_email": {
                        "type": "string",
                        "description": "Only tickets belonging to the contact with this email"
                    },
                    "customer_phone": {
                        "type": "string",
                        "description": "Only tickets belonging to the contact with this phone number"
                    },
                    "created_after": {
                        "type": "string",
                        "description": "Inclusive lower bound on creation date, YYYY-MM-DD"
                    },
                    "created_before": {
                        "type": "string",
                        "description": "Inclusive upper bound on creation date, YYYY-MM-DD"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of tickets to return (default 100)"
                    }
                },
                "required": ["agent_id"]
            }),
        }
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<Value> {
        let mut filter = TicketFilter {
            status: opt_str(args, "status"),
            priority: opt_str(args, "priority"),
            category: opt_str(args, "category"),
            limit: Some(parse_limit(args)),
            ..Default::default()
        };

        if let Some(raw) = opt_str(args, "created_after") {
            filter.created_after = Some(parse_day_bound(&raw, "created_after", false)?);
        }
        if let Some(raw) = opt_str(args, "created_before") {
            filter.created_before = Some(parse_day_bound(&raw, "created_before", true)?);
        }

        // Indirect contact filters: an unresolved contact means no results,
        // not an error.
        if let Some(email) = opt_str(args, "customer_email") {
            match ctx.db.get_contact_by_email(&email)? {
                Some(contact) => filter.contact_id = Some(contact.id),
                None => return Ok(json!({"success": true, "count": 0, "tickets": []})),
            }
        } else if let Some(phone) = opt_str(args, "customer_phone") {
            match ctx.db.get_contact_by_phone(&phone)? {
                Some(contact) => filter.contact_id = Some(contact.id),
                None => return Ok(json!({"success": true, "count": 0, "tickets": []})),
            }
        }

        let tickets = ctx.db.list_tickets(&filter)?;
        debug!("get_support_tickets: returning {} tickets", tickets.len());

        Ok(json!({
            "success": true,
            "count": tickets.len(),
            "tickets": tickets,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// create_support_ticket
// ─────────────────────────────────────────────────────────────────────────────

pub struct CreateTicketTool;

#[async_trait]
impl SupportTool for CreateTicketTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "create_support_ticket".to_string(),
            description: "Create a new support ticket for a customer. The customer contact is \
                          looked up by phone number and created if missing. Returns the new \
                          ticket including its ticket number."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "agent_id": {
                        "type": "string",
                        "description": "ID of the calling agent (required for authorization)"
                    },
                    "phone_number": {
                        "type": "string",
                        "description": "End-user phone number for audit traceability"
                    },
                    "subject": {
                        "type": "string",
                        "description": "Short summary of the issue"
                    },
                    "description": {
                        "type": "string",
                        "description": "Full description of the issue"
                    },
                    "customer_name": {
                        "type": "string",
                        "description": "Customer display name, used if a new contact is created"
                    },
                    "customer_phone": {
                        "type": "string",
                        "description": "Customer phone number; the contact's natural key"
                    },
                    "priority": {
                        "type": "string",
                        "description": "Ticket priority",
                        "enum": ["Low", "Medium", "High", "Urgent"]
                    },
                    "category": {
                        "type": "string",
                        "description": "Functional category, e.g. Billing or Hardware"
                    }
                },
                "required": ["agent_id", "subject", "customer_phone"]
            }),
        }
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<Value> {
        let subject = req_str(args, "subject")?;
        let customer_phone = req_str(args, "customer_phone")?;
        let customer_name = opt_str(args, "customer_name").unwrap_or_else(|| "Unknown".to_string());

        let contact = ctx
            .db
            .find_or_create_contact_by_phone(customer_phone, &customer_name)?;

        let ticket = ctx.db.create_ticket(&NewTicket {
            contact_id: Some(contact.id),
            subject: subject.to_string(),
            description: opt_str(args, "description"),
            priority: opt_str(args, "priority"),
            category: opt_str(args, "category"),
        })?;

        debug!("create_support_ticket: created {}", ticket.ticket_number);

        Ok(json!({
            "success": true,
            "ticket": ticket,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// update_support_ticket
// ─────────────────────────────────────────────────────────────────────────────

pub struct UpdateTicketTool;

#[async_trait]
impl SupportTool for UpdateTicketTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "update_support_ticket".to_string(),
            description: "Update fields on an existing support ticket by ticket number. Only \
                          the supplied fields change. Returns the ticket after the update."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "agent_id": {
                        "type": "string",
                        "description": "ID of the calling agent (required for authorization)"
                    },
                    "phone_number": {
                        "type": "string",
                        "description": "End-user phone number for audit traceability"
                    },
                    "ticket_number": {
                        "type": "string",
                        "description": "Stable ticket identifier, e.g. TKT-1A2B3C4D"
                    },
                    "subject": { "type": "string", "description": "New subject" },
                    "description": { "type": "string", "description": "New description" },
                    "status": {
                        "type": "string",
                        "description": "New status",
                        "enum": ["Open", "In Progress", "Resolved", "Closed"]
                    },
                    "priority": {
                        "type": "string",
                        "description": "New priority",
                        "enum": ["Low", "Medium", "High", "Urgent"]
                    },
                    "category": { "type": "string", "description": "New category" },
                    "satisfaction_rating": {
                        "type": "integer",
                        "description": "Customer satisfaction rating, 1-5"
                    }
                },
                "required": ["agent_id", "ticket_number"]
            }),
        }
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<Value> {
        let ticket_number = req_str(args, "ticket_number")?;

        // Typed extraction doubles as the non-domain field strip: agent_id
        // and phone_number never make it into the update set.
        let update = TicketUpdate {
            subject: opt_str(args, "subject"),
            description: opt_str(args, "description"),
            status: opt_str(args, "status"),
            priority: opt_str(args, "priority"),
            category: opt_str(args, "category"),
            satisfaction_rating: args.get("satisfaction_rating").and_then(Value::as_i64),
        };

        let ticket = ctx
            .db
            .update_ticket(ticket_number, &update)?
            .ok_or_else(|| Error::TicketNotFound(ticket_number.to_string()))?;

        debug!("update_support_ticket: updated {}", ticket.ticket_number);

        Ok(json!({
            "success": true,
            "ticket": ticket,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// delete_support_ticket
// ─────────────────────────────────────────────────────────────────────────────

pub struct DeleteTicketTool;

#[async_trait]
impl SupportTool for DeleteTicketTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "delete_support_ticket".to_string(),
            description: "Delete a support ticket by ticket number. Succeeds whether or not \
                          the ticket existed."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "agent_id": {
                        "type": "string",
                        "description": "ID of the calling agent (required for authorization)"
                    },
                    "phone_number": {
                        "type": "string",
                        "description": "End-user phone number for audit traceability"
                    },
                    "ticket_number": {
                        "type": "string",
                        "description": "Stable ticket identifier, e.g. TKT-1A2B3C4D"
                    }
                },
                "required": ["agent_id", "ticket_number"]
            }),
        }
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<Value> {
        let ticket_number = req_str(args, "ticket_number")?;
        let deleted = ctx.db.delete_ticket(ticket_number)?;

        debug!(
            "delete_support_ticket: {} rows removed for {}",
            deleted, ticket_number
        );

        Ok(json!({
            "success": true,
            "deleted": deleted,
            "ticket_number": ticket_number,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// get_support_summary
// ─────────────────────────────────────────────────────────────────────────────

pub struct SummaryTool;

#[async_trait]
impl SupportTool for SummaryTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "get_support_summary".to_string(),
            description: "Aggregate statistics over support tickets: totals, breakdowns by \
                          status/priority/category, average satisfaction and resolution rate. \
                          Optionally restricted to one status."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "agent_id": {
                        "type": "string",
                        "description": "ID of the calling agent (required for authorization)"
                    },
                    "phone_number": {
                        "type": "string",
                        "description": "End-user phone number for audit traceability"
                    },
                    "status": {
                        "type": "string",
                        "description": "Restrict the aggregation to tickets with this status",
                        "enum": ["Open", "In Progress", "Resolved", "Closed"]
                    }
                },
                "required": ["agent_id"]
            }),
        }
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<Value> {
        let filter = TicketFilter {
            status: opt_str(args, "status"),
            ..Default::default()
        };
        let tickets = ctx.db.list_tickets(&filter)?;
        let stats = TicketStats::compute(&tickets);

        Ok(json!({
            "success": true,
            "stats": stats,
        }))
    }
}
