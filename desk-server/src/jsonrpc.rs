//! JSON-RPC 2.0 message types.
//!
//! One inbound request maps to exactly one response; a response carries
//! exactly one of `result` or `error`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// Malformed request body; never reaches the dispatcher
pub const PARSE_ERROR: i32 = -32700;
/// Generic wrapper for every dispatcher-level failure
pub const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    /// Correlation token echoed back in the response; defaults to 1 if absent
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

impl JsonRpcRequest {
    /// The id the response must carry
    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or_else(|| json!(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Value, code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
            id,
        }
    }
}
