//! Tool trait and registry.
//!
//! Each tool is a value implementing [`SupportTool`], looked up by name from
//! the registry. Adding a tool means registering a new implementer; the
//! `tools/list` catalog and the executable set cannot drift because both come
//! from the same registration.

pub mod tickets;

use async_trait::async_trait;
use desk_core::{Database, Result};
use serde_json::Value;
use std::sync::Arc;

use tickets::{
    CreateTicketTool, DeleteTicketTool, GetTicketsTool, SummaryTool, UpdateTicketTool,
};

/// Public catalog entry for one tool, consumed by the calling agent runtime
/// for argument construction. Changing a schema is a breaking change.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Execution context handed to every tool
#[derive(Clone)]
pub struct ToolContext {
    pub db: Arc<Database>,
}

/// A named, schema-described callable operation
#[async_trait]
pub trait SupportTool: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    /// Run the tool. Returns the business payload that gets serialized into
    /// the `{"success": true, ...}` content wrapper.
    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<Value>;
}

/// Ordered catalog of registered tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn SupportTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Arc<dyn SupportTool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn SupportTool>> {
        self.tools.iter().find(|t| t.descriptor().name == name)
    }

    /// Full catalog in registration order (the `tools/list` surface)
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Registry with the standard support tools
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(GetTicketsTool));
    registry.register(Arc::new(CreateTicketTool));
    registry.register(Arc::new(UpdateTicketTool));
    registry.register(Arc::new(DeleteTicketTool));
    registry.register(Arc::new(SummaryTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_tool_is_executable() {
        let registry = default_registry();
        assert!(!registry.is_empty());
        // Catalog and executable set come from the same registrations;
        // every descriptor name must resolve back to its tool.
        for descriptor in registry.descriptors() {
            assert!(
                registry.get(&descriptor.name).is_some(),
                "tool {} listed but not callable",
                descriptor.name
            );
        }
    }

    #[test]
    fn test_registry_has_expected_tools() {
        let registry = default_registry();
        let names: Vec<String> = registry
            .descriptors()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "get_support_tickets",
                "create_support_ticket",
                "update_support_ticket",
                "delete_support_ticket",
                "get_support_summary",
            ]
        );
    }

    #[test]
    fn test_descriptors_carry_object_schemas() {
        for descriptor in default_registry().descriptors() {
            assert_eq!(descriptor.input_schema["type"], "object");
            assert!(descriptor.input_schema["properties"].is_object());
            assert!(!descriptor.description.is_empty());
        }
    }
}
