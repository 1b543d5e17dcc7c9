//! # Task Listing Handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::debug;

use crate::models::Task;
use crate::web::response_types::{ApiError, ApiResult};
use crate::web::state::AppState;

/// Tasks of one user, earliest due first
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub user_id: String,
    pub count: usize,
    pub tasks: Vec<Task>,
}

/// List a user's tasks: GET /users/{user_id}/tasks
pub async fn list_user_tasks(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<TaskListResponse>> {
    if user_id.trim().is_empty() {
        return Err(ApiError::bad_request("user_id must not be empty"));
    }

    let tasks = state.store.find_by_user(&user_id).await?;
    debug!(user_id = %user_id, count = tasks.len(), "Listed tasks");

    Ok(Json(TaskListResponse {
        user_id,
        count: tasks.len(),
        tasks,
    }))
}
