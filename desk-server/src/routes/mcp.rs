//! MCP transport adapter: one HTTP POST carries one JSON-RPC exchange.
//!
//! Session continuity rides on the `Mcp-Session-Id` header: absent on the
//! first call, generated here, echoed back, and replayed by the client on
//! subsequent calls. Protocol-level failures travel in the JSON-RPC `error`
//! field with HTTP 200; only a malformed body gets a 4xx.

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse, PARSE_ERROR};
use crate::session::SessionRegistry;
use crate::state::AppState;

/// Session continuity header, request and response
pub const SESSION_HEADER: &str = "Mcp-Session-Id";

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/mcp", post(handle_mcp))
}

async fn handle_mcp(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| {
            let id = SessionRegistry::new_session_id();
            debug!("new session {}", id);
            id
        });

    // A parse failure is a transport-level error: no dispatch, no session
    // processing, client-error status.
    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            let response = JsonRpcResponse::error(
                json!(1),
                PARSE_ERROR,
                "Parse error",
                Some(json!(e.to_string())),
            );
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    let response = state.dispatcher.dispatch(request, &session_id).await;

    let mut http = (StatusCode::OK, Json(response)).into_response();
    if let Ok(value) = HeaderValue::from_str(&session_id) {
        http.headers_mut().insert(SESSION_HEADER, value);
    }
    http
}
