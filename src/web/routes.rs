//! # Web API Route Definitions

use crate::web::handlers;
use crate::web::state::AppState;
use axum::routing::{get, post};
use axum::Router;

/// Inbound chat platform events
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhook", post(handlers::webhook::handle_webhook))
}

/// Read-only task queries
pub fn task_routes() -> Router<AppState> {
    Router::new().route("/users/{user_id}/tasks", get(handlers::tasks::list_user_tasks))
}

/// - `/health` - Basic health check
/// - `/ready` - Readiness probe
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::basic_health))
        .route("/ready", get(handlers::health::readiness_probe))
}
