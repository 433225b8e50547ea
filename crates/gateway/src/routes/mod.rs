//! HTTP routes

pub mod health;
pub mod tools;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create all HTTP routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/mcp/:prefix/tools", get(tools::list_tools))
        .route("/mcp/:prefix/:tool_name", post(tools::call_tool))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
