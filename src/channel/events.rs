//! # Webhook Event Normalization
//!
//! Deserializes the platform's webhook payload and turns text message events
//! into task creation requests. Only `message` events with a `text` body
//! produce tasks; everything else (follows, stickers, postbacks) is ignored.
//!
//! A message may carry an explicit due time as a trailing `@ <RFC 3339>`
//! marker, e.g. `Submit report @ 2025-10-01T12:00:00Z`. There is no
//! natural-language date parsing.

use crate::channel::WebhookError;
use crate::constants::DEFAULT_CHANNEL;
use crate::models::Task;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Top-level webhook body
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

impl WebhookPayload {
    pub fn from_slice(body: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(body).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<EventSource>,
    #[serde(default)]
    pub message: Option<EventMessage>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A validated request to create a task from an inbound message
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCreationRequest {
    pub user_id: String,
    pub title: String,
    pub due_at: Option<DateTime<Utc>>,
    pub reply_token: Option<String>,
    /// Platform message id; redeliveries of the same message carry the same id
    pub message_id: Option<String>,
}

impl TaskCreationRequest {
    /// Normalize an event; `None` when the event does not describe a task
    pub fn from_event(event: &WebhookEvent) -> Option<Self> {
        Self::from_event_at(event, Utc::now())
    }

    pub fn from_event_at(event: &WebhookEvent, now: DateTime<Utc>) -> Option<Self> {
        if event.event_type != "message" {
            return None;
        }
        let message = event.message.as_ref()?;
        if message.message_type != "text" {
            return None;
        }
        let user_id = event
            .source
            .as_ref()
            .and_then(|s| s.user_id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty())?;

        let (title, due_at) = split_due_marker(message.text.as_deref()?, now);
        if title.is_empty() {
            return None;
        }

        Some(Self {
            user_id: user_id.to_string(),
            title,
            due_at,
            reply_token: event.reply_token.clone(),
            message_id: message
                .id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        })
    }

    /// Task identifier derived from the platform message id, so a redelivered
    /// event upserts the same task and replaces its reminder
    pub fn task_id(&self) -> Option<String> {
        self.message_id
            .as_ref()
            .map(|id| format!("{DEFAULT_CHANNEL}-{id}"))
    }

    pub fn into_task(self) -> Task {
        match self.task_id() {
            Some(task_id) => Task::with_id(task_id, self.user_id, self.title, self.due_at),
            None => Task::new(self.user_id, self.title, self.due_at),
        }
    }
}

/// Split `title @ timestamp` into its parts.
///
/// A marker that does not parse keeps the whole text as the title and yields
/// `now`, so the reminder fires instead of being dropped.
fn split_due_marker(text: &str, now: DateTime<Utc>) -> (String, Option<DateTime<Utc>>) {
    let text = text.trim();
    match text.rsplit_once(" @ ") {
        Some((title, marker)) => match DateTime::parse_from_rfc3339(marker.trim()) {
            Ok(due) => (title.trim().to_string(), Some(due.with_timezone(&Utc))),
            Err(_) => (text.to_string(), Some(now)),
        },
        None => (text.to_string(), None),
    }
}
