//! HTTP route modules.

pub mod health;
pub mod mcp;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Create the main router with all routes.
///
/// CORS is fully permissive: the server is meant to be called directly from
/// arbitrary agent runtimes, and the layer answers OPTIONS pre-flight probes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(mcp::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
