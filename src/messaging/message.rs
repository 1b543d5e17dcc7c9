//! # Reminder Job Message
//!
//! Payload stored in the durable reminder queue. The job carries a full task
//! snapshot so the worker can deliver after a restart without consulting the
//! task store.

use crate::models::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Message for a delayed reminder job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderJobMessage {
    /// Task identifier; the queue is searched on this key for cancellation
    pub task_id: String,
    /// Task snapshot taken when the reminder was scheduled
    pub task: Task,
    /// Instant the reminder was meant to fire. A missing or unreadable value
    /// decodes as the current time so the job is still delivered.
    #[serde(default = "Utc::now", deserialize_with = "lenient_reminder_time")]
    pub reminder_time: DateTime<Utc>,
    /// When the job was enqueued
    pub enqueued_at: DateTime<Utc>,
}

impl ReminderJobMessage {
    pub fn new(task: Task, reminder_time: DateTime<Utc>) -> Self {
        Self {
            task_id: task.task_id.clone(),
            task,
            reminder_time,
            enqueued_at: Utc::now(),
        }
    }

    /// Seconds between the intended fire time and `now`; zero when early
    pub fn lateness_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.reminder_time).num_seconds().max(0)
    }
}

fn lenient_reminder_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let parsed = raw
        .as_str()
        .and_then(|value| DateTime::parse_from_rfc3339(value.trim()).ok())
        .map(|value| value.with_timezone(&Utc));

    Ok(parsed.unwrap_or_else(|| {
        warn!(reminder_time = %raw, "Unreadable reminder time in job, treating as due now");
        Utc::now()
    }))
}
