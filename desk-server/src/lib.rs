//! desk-server - Support Desk MCP server
//!
//! A JSON-RPC 2.0 / MCP server exposing a typed, permission-checked and
//! audit-logged tool-calling surface over the support ticket store.

pub mod config;
pub mod jsonrpc;
pub mod mcp;
pub mod routes;
pub mod session;
pub mod state;
