//! # Web API Module
//!
//! Axum HTTP surface: the chat platform webhook, task listing, and health
//! probes.
//!
//! - [`routes`] - route definitions
//! - [`handlers`] - request handlers
//! - [`state`] - shared application state
//! - [`response_types`] - API errors and their HTTP responses

pub mod handlers;
pub mod response_types;
pub mod routes;
pub mod state;

use axum::Router;
use state::AppState;
use tower_http::trace::TraceLayer;

pub use response_types::{ApiError, ApiResult};

/// Create the Axum application with all routes and shared state
pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::webhook_routes())
        .merge(routes::task_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
