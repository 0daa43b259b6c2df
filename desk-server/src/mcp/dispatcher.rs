//! MCP request dispatcher.
//!
//! Routes one JSON-RPC message to its method handler and converts the
//! outcome into a well-formed response. Handlers return `Result<Value>`;
//! [`McpDispatcher::dispatch`] is the single point where errors become the
//! JSON-RPC `-32603` wrapper, so the transport never sees a failure escape
//! unconverted.

use desk_core::{Database, Error, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR};
use crate::session::SessionRegistry;

use super::audit::AuditLogger;
use super::permissions::{PermissionCheck, PermissionResolver};
use super::tools::{default_registry, ToolContext, ToolRegistry};
use super::{prompts, resources};

/// MCP protocol revision advertised at initialize
const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct McpDispatcher {
    db: Arc<Database>,
    sessions: Arc<SessionRegistry>,
    tools: ToolRegistry,
    permissions: PermissionResolver,
    audit: AuditLogger,
}

impl McpDispatcher {
    pub fn new(db: Arc<Database>, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            permissions: PermissionResolver::new(Arc::clone(&db)),
            audit: AuditLogger::new(Arc::clone(&db)),
            tools: default_registry(),
            db,
            sessions,
        }
    }

    /// Number of registered tools (health reporting)
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Handle one JSON-RPC message for one session.
    ///
    /// Always produces a response carrying either `result` or `error` and
    /// echoing the request id (1 when the request carried none).
    pub async fn dispatch(&self, request: JsonRpcRequest, session_id: &str) -> JsonRpcResponse {
        let id = request.response_id();
        debug!("dispatch: method={} session={}", request.method, session_id);

        match self.route(&request, session_id).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                warn!("dispatch: method={} failed: {}", request.method, e);
                JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string(), None)
            }
        }
    }

    async fn route(&self, request: &JsonRpcRequest, session_id: &str) -> Result<Value> {
        let params = request.params.clone().unwrap_or_else(|| json!({}));
        match request.method.as_str() {
            "initialize" => self.handle_initialize(&params, session_id).await,
            "resources/list" => Ok(resources::list()),
            "resources/read" => self.handle_resources_read(&params),
            "prompts/list" => Ok(prompts::list()),
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => self.handle_tools_call(&params).await,
            other => Err(Error::MethodNotFound(other.to_string())),
        }
    }

    /// Mark the session initialized and advertise capabilities.
    ///
    /// Idempotent; the client-supplied agent id is recorded informationally.
    async fn handle_initialize(&self, params: &Value, session_id: &str) -> Result<Value> {
        let agent_id = params
            .get("clientInfo")
            .and_then(|c| c.get("agentId"))
            .and_then(Value::as_str)
            .map(String::from);

        self.sessions.initialize(session_id, agent_id).await;

        Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "resources": {},
                "prompts": {},
                "tools": {}
            },
            "serverInfo": {
                "name": "desk-server",
                "version": env!("CARGO_PKG_VERSION")
            }
        }))
    }

    fn handle_resources_read(&self, params: &Value) -> Result<Value> {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or(Error::MissingParam("uri"))?;
        resources::read(&self.db, uri)
    }

    /// Full tool catalog, unconditionally: listing is not permission-gated,
    /// authorization happens only at call time.
    fn handle_tools_list(&self) -> Value {
        json!({ "tools": self.tools.descriptors() })
    }

    /// The authorization-and-execution path. Each step is a hard gate; every
    /// attempt that passes agent identification leaves exactly one audit row,
    /// written before the response value is built.
    async fn handle_tools_call(&self, params: &Value) -> Result<Value> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or(Error::MissingParam("name"))?;
        let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        // Gate 1: agent_id must be present before any data store access.
        let agent_id = args
            .get("agent_id")
            .and_then(Value::as_str)
            .ok_or(Error::MissingParam("agent_id"))?
            .to_string();
        let user_context = args.get("phone_number").and_then(Value::as_str).map(String::from);

        // Gates 2-4: agent lookup, permission record, namespace membership.
        let PermissionCheck {
            agent_name,
            allowed,
        } = self.permissions.resolve(&agent_id, name)?;

        if !allowed {
            let denial = Error::PermissionDenied {
                agent: agent_id.clone(),
                tool: name.to_string(),
            };
            self.audit.denied(
                &agent_id,
                &agent_name,
                name,
                user_context.as_deref(),
                &denial.to_string(),
            )?;
            return Err(denial);
        }

        // A permitted name that no tool implements means the catalog and the
        // grant records drifted apart.
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        let ctx = ToolContext {
            db: Arc::clone(&self.db),
        };
        match tool.execute(&args, &ctx).await {
            Ok(output) => {
                self.audit.success(
                    &agent_id,
                    &agent_name,
                    name,
                    user_context.as_deref(),
                    &args,
                    &output,
                )?;
                Ok(json!({
                    "content": [
                        {
                            "type": "text",
                            "text": output.to_string()
                        }
                    ]
                }))
            }
            Err(e) => {
                self.audit.error(
                    &agent_id,
                    &agent_name,
                    name,
                    user_context.as_deref(),
                    &e.to_string(),
                )?;
                Err(e)
            }
        }
    }
}
