//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: HealthComponents,
    pub metrics: HealthMetrics,
}

#[derive(Serialize)]
pub struct HealthComponents {
    pub database: bool,
}

#[derive(Serialize)]
pub struct HealthMetrics {
    pub sessions: usize,
    pub tools: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    let db_healthy = state.db.ping().is_ok();

    let status = if db_healthy { "healthy" } else { "degraded" };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: HealthComponents {
            database: db_healthy,
        },
        metrics: HealthMetrics {
            sessions: state.sessions.len().await,
            tools: state.dispatcher.tool_count(),
        },
    })
}
