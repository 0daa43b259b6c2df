//! MCP dispatch core: method routing, tool registry, authorization and
//! audit logging.

pub mod audit;
pub mod dispatcher;
pub mod permissions;
pub mod prompts;
pub mod resources;
pub mod tools;

pub use dispatcher::McpDispatcher;
