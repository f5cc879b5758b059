//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealthResponse,
    pub pages: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealthResponse {
    pub connected: bool,
    pub pool_size: u32,
    pub idle_connections: usize,
}

/// GET /health - service status, pool stats, and registered pages.
#[tracing::instrument(name = "http.health", skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.store.ping().await.is_ok();
    let (pool_size, idle_connections) = state.store.pool_status();

    Json(HealthResponse {
        status: if connected { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealthResponse {
            connected,
            pool_size,
            idle_connections,
        },
        pages: state
            .pipeline
            .page_names()
            .into_iter()
            .map(String::from)
            .collect(),
    })
}
