//! desk-core - Core library for the Support Desk MCP server
//!
//! Domain types, the SQLite data store, and statistics aggregation shared by
//! the server binary and its tests.

pub mod db;
pub mod error;
pub mod stats;
pub mod types;

pub use db::Database;
pub use error::{Error, Result};
pub use stats::TicketStats;
