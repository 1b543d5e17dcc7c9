//! # Reminder Dispatcher
//!
//! Renders the final reminder text and sends it through the outbound channel.
//! Failures are returned unmodified; retrying is not this layer's job.

use crate::channel::{DeliveryError, PushClient};
use crate::constants::DUE_TIME_FORMAT;
use crate::logging::log_delivery_operation;
use crate::models::Task;
use async_trait::async_trait;

/// Delivery seam invoked by the scheduler when a reminder fires
#[async_trait]
pub trait ReminderDispatcher: Send + Sync + std::fmt::Debug {
    async fn dispatch_task_reminder(&self, task: &Task) -> Result<(), DeliveryError>;
}

/// `"Reminder: {title}{due_suffix}. {closing_phrase}"`
///
/// The closing phrase is always the verbatim suffix.
pub fn build_message_text(task: &Task, closing_phrase: &str) -> String {
    let due_suffix = task
        .due_at
        .map(|due| format!(" (due {})", due.format(DUE_TIME_FORMAT)))
        .unwrap_or_default();
    format!("Reminder: {}{}. {}", task.title, due_suffix, closing_phrase)
}

/// Dispatcher pushing reminders through the messaging platform
#[derive(Debug, Clone)]
pub struct LineDispatcher {
    client: PushClient,
    closing_phrase: String,
}

impl LineDispatcher {
    pub fn new(client: PushClient, closing_phrase: impl Into<String>) -> Self {
        Self {
            client,
            closing_phrase: closing_phrase.into(),
        }
    }

    pub fn build_message_text(&self, task: &Task) -> String {
        build_message_text(task, &self.closing_phrase)
    }

    pub fn closing_phrase(&self) -> &str {
        &self.closing_phrase
    }
}

#[async_trait]
impl ReminderDispatcher for LineDispatcher {
    async fn dispatch_task_reminder(&self, task: &Task) -> Result<(), DeliveryError> {
        let text = self.build_message_text(task);
        self.client.push_text(&task.user_id, &text).await?;
        log_delivery_operation(&task.task_id, &task.user_id, "delivered", None);
        Ok(())
    }
}
