//! # Webhook Handler
//!
//! Receives chat events, turns text messages into tasks, and schedules their
//! reminders. Any save or scheduling failure answers 500 so the platform can
//! redeliver the event. Task ids come from the platform message id, so a
//! redelivery overwrites the tasks and reminders it already created.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::channel::{verify_signature, TaskCreationRequest, WebhookPayload};
use crate::constants::channel::SIGNATURE_HEADER;
use crate::logging::log_error;
use crate::models::ReminderRequest;
use crate::web::response_types::{ApiError, ApiResult};
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub scheduled: usize,
}

/// Webhook endpoint: POST /webhook
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    verify_signature(&state.channel_secret, &body, signature).map_err(|e| {
        warn!("Rejected webhook: {}", e);
        ApiError::from(e)
    })?;

    let payload = WebhookPayload::from_slice(&body)?;
    debug!(events = payload.events.len(), "📥 Webhook received");

    let mut scheduled = 0usize;
    for event in &payload.events {
        let Some(creation) = TaskCreationRequest::from_event(event) else {
            debug!(event_type = %event.event_type, "Ignoring non-task event");
            continue;
        };

        let reply_token = creation.reply_token.clone();
        let task = creation.into_task();

        if let Err(e) = state.store.save(&task).await {
            log_error("webhook", "save_task", &e.to_string(), Some(&task.task_id));
            return Err(ApiError::database_error("save task"));
        }

        let task_id = task.task_id.clone();
        let request = ReminderRequest::for_task(task, state.default_offset_minutes).map_err(|e| {
            log_error("webhook", "reminder_time", &e.to_string(), Some(&task_id));
            ApiError::scheduling_error(&task_id)
        })?;
        if let Err(e) = state.scheduler.schedule_reminder(&request).await {
            log_error("webhook", "schedule_reminder", &e.to_string(), Some(request.task_id()));
            return Err(ApiError::scheduling_error(request.task_id()));
        }
        scheduled += 1;
        info!(
            task_id = %request.task_id(),
            reminder_time = %request.reminder_time.to_rfc3339(),
            "✅ Task accepted"
        );

        if let Some(token) = reply_token {
            let text = state.acknowledger.acknowledge(&request).await;
            if let Err(e) = state.push_client.reply_text(&token, &text).await {
                warn!(task_id = %request.task_id(), "Acknowledgement reply failed: {}", e);
            }
        }
    }

    Ok(Json(WebhookResponse {
        status: "ok",
        scheduled,
    }))
}
