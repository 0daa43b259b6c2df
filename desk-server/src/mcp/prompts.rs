//! Prompt template catalog. Static; included for protocol completeness.

use serde_json::{json, Value};

/// Catalog for `prompts/list`
pub fn list() -> Value {
    json!({
        "prompts": [
            {
                "name": "triage_ticket",
                "description": "Suggest a priority and category for a new support ticket",
                "arguments": [
                    {
                        "name": "subject",
                        "description": "The ticket subject line",
                        "required": true
                    },
                    {
                        "name": "description",
                        "description": "The full issue description",
                        "required": false
                    }
                ]
            },
            {
                "name": "summarize_queue",
                "description": "Summarize the current support queue for a stand-up update",
                "arguments": [
                    {
                        "name": "status",
                        "description": "Restrict the summary to tickets with this status",
                        "required": false
                    }
                ]
            }
        ]
    })
}
