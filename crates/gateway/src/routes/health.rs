//! Health check endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub prefixes: Vec<String>,
    pub version: String,
}

/// Liveness of the gateway process; does not call any backend
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        prefixes: state.clients.prefixes(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
