//! # Health Check Handlers
//!
//! Liveness and readiness endpoints for monitoring and load balancing.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::{debug, warn};

use crate::scheduler::SchedulerMode;
use crate::web::response_types::{ApiError, ApiResult};
use crate::web::state::AppState;

/// Basic health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
}

/// Readiness details
#[derive(Serialize)]
pub struct ReadinessResponse {
    status: String,
    timestamp: String,
    environment: String,
    scheduler_mode: SchedulerMode,
    pending_reminders: Option<usize>,
}

/// Basic health check endpoint: GET /health
///
/// Returns OK while the process is serving requests.
pub async fn basic_health(_state: State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Readiness probe: GET /ready
///
/// Ready once the scheduler is initialized and until it shuts down.
pub async fn readiness_probe(State(state): State<AppState>) -> ApiResult<Json<ReadinessResponse>> {
    debug!("Performing readiness probe");

    let scheduler = &state.scheduler;
    if !scheduler.is_initialized() || scheduler.is_stopped() {
        return Err(ApiError::ServiceUnavailable);
    }

    let pending_reminders = match scheduler.pending_count().await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!("Pending reminder count unavailable: {}", e);
            None
        }
    };

    Ok(Json(ReadinessResponse {
        status: "ready".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        environment: state.environment.clone(),
        scheduler_mode: scheduler.mode().await,
        pending_reminders,
    }))
}
