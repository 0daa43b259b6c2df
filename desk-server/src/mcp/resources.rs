//! Readable resources: named ticket views an agent can fetch without a tool
//! call. Discovery is static; reads hit the data store.

use desk_core::types::{TicketFilter, DEFAULT_TICKET_LIMIT};
use desk_core::{Database, Error, Result, TicketStats};
use serde_json::{json, Value};

pub const URI_ALL: &str = "tickets://all";
pub const URI_OPEN: &str = "tickets://open";
pub const URI_STATS: &str = "tickets://stats";

/// Static resource catalog for `resources/list`
pub fn list() -> Value {
    json!({
        "resources": [
            {
                "uri": URI_ALL,
                "name": "All support tickets",
                "description": "The most recent support tickets, all statuses",
                "mimeType": "application/json"
            },
            {
                "uri": URI_OPEN,
                "name": "Open support tickets",
                "description": "Support tickets currently in Open status",
                "mimeType": "application/json"
            },
            {
                "uri": URI_STATS,
                "name": "Support ticket statistics",
                "description": "Aggregated counts, satisfaction average and resolution rate",
                "mimeType": "application/json"
            }
        ]
    })
}

/// Execute the query behind a resource uri and wrap it as MCP content
pub fn read(db: &Database, uri: &str) -> Result<Value> {
    let text = match uri {
        URI_ALL => {
            let tickets = db.list_tickets(&TicketFilter {
                limit: Some(DEFAULT_TICKET_LIMIT),
                ..Default::default()
            })?;
            serde_json::to_string(&tickets)?
        }
        URI_OPEN => {
            let tickets = db.list_tickets(&TicketFilter {
                status: Some("Open".to_string()),
                limit: Some(DEFAULT_TICKET_LIMIT),
                ..Default::default()
            })?;
            serde_json::to_string(&tickets)?
        }
        URI_STATS => {
            let tickets = db.list_tickets(&TicketFilter::default())?;
            serde_json::to_string(&TicketStats::compute(&tickets))?
        }
        other => return Err(Error::UnknownResource(other.to_string())),
    };

    Ok(json!({
        "contents": [
            {
                "uri": uri,
                "mimeType": "application/json",
                "text": text
            }
        ]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use desk_core::types::NewTicket;

    #[test]
    fn test_catalog_uris_are_readable() {
        let db = Database::open_in_memory().unwrap();
        db.init_schema().unwrap();

        let catalog = list();
        for resource in catalog["resources"].as_array().unwrap() {
            let uri = resource["uri"].as_str().unwrap();
            let content = read(&db, uri).unwrap();
            assert_eq!(content["contents"][0]["uri"], uri);
            assert_eq!(content["contents"][0]["mimeType"], "application/json");
        }
    }

    #[test]
    fn test_open_view_filters_status() {
        let db = Database::open_in_memory().unwrap();
        db.init_schema().unwrap();
        let t = db
            .create_ticket(&NewTicket {
                subject: "a".to_string(),
                ..Default::default()
            })
            .unwrap();
        db.update_ticket(
            &t.ticket_number,
            &desk_core::types::TicketUpdate {
                status: Some("Resolved".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        db.create_ticket(&NewTicket {
            subject: "b".to_string(),
            ..Default::default()
        })
        .unwrap();

        let content = read(&db, URI_OPEN).unwrap();
        let text = content["contents"][0]["text"].as_str().unwrap();
        let tickets: Vec<Value> = serde_json::from_str(text).unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0]["subject"], "b");
    }

    #[test]
    fn test_unknown_uri_errors() {
        let db = Database::open_in_memory().unwrap();
        db.init_schema().unwrap();
        let err = read(&db, "tickets://nope").unwrap_err();
        assert!(matches!(err, Error::UnknownResource(_)));
    }
}
