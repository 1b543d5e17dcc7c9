//! # Task Model
//!
//! A task is a reminder-worthy item submitted by a chat user. Tasks are created
//! by the inbound webhook adapter on the first message and are immutable once
//! persisted, apart from `status` and `updated_at`.
//!
//! ## Database Schema
//!
//! Maps to the `reminder_tasks` table:
//! - `task_id`: Primary key (TEXT; derived from the platform message id, or a UUID v4)
//! - `user_id`: Owning chat user (TEXT, indexed)
//! - `title`: Non-empty reminder text
//! - `due_at`: Optional absolute due time (TIMESTAMPTZ)
//! - `priority` / `status` / `channel`: TEXT tags

use crate::constants::DEFAULT_CHANNEL;
use crate::error::{self, ReminderError};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task priority, defaulting to `Normal`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Normal,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Normal => "normal",
            TaskPriority::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "normal" => Ok(TaskPriority::Normal),
            "high" => Ok(TaskPriority::High),
            other => Err(format!("Unknown task priority: {other}")),
        }
    }
}

/// Task lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Snoozed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Snoozed => "snoozed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            "snoozed" => Ok(TaskStatus::Snoozed),
            other => Err(format!("Unknown task status: {other}")),
        }
    }
}

/// A persisted reminder task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub user_id: String,
    pub title: String,
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
    pub channel: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a pending task with a fresh UUID identifier
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        due_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), user_id, title, due_at)
    }

    /// Create a pending task with a caller-supplied identifier
    pub fn with_id(
        task_id: impl Into<String>,
        user_id: impl Into<String>,
        title: impl Into<String>,
        due_at: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            task_id: task_id.into(),
            user_id: user_id.into(),
            title: title.into(),
            due_at,
            priority: TaskPriority::default(),
            status: TaskStatus::default(),
            channel: DEFAULT_CHANNEL.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Validate the invariants a task must satisfy before it is persisted
    pub fn validate(&self) -> Result<(), String> {
        if self.task_id.trim().is_empty() {
            return Err("task_id must not be empty".to_string());
        }
        if self.user_id.trim().is_empty() {
            return Err("user_id must not be empty".to_string());
        }
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        Ok(())
    }
}

/// A task paired with the instant its reminder should fire.
///
/// Not persisted on its own; this is the unit of work submitted to the
/// scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub task: Task,
    pub reminder_time: DateTime<Utc>,
}

impl ReminderRequest {
    pub fn new(task: Task, reminder_time: DateTime<Utc>) -> Self {
        Self {
            task,
            reminder_time,
        }
    }

    /// Build a request using the task's due time, or `now + default_offset_minutes`
    /// when the task has none.
    pub fn for_task(task: Task, default_offset_minutes: i64) -> error::Result<Self> {
        Self::for_task_at(task, default_offset_minutes, Utc::now())
    }

    /// Fails when the offset cannot be added to `now` without leaving the
    /// representable time range
    pub fn for_task_at(
        task: Task,
        default_offset_minutes: i64,
        now: DateTime<Utc>,
    ) -> error::Result<Self> {
        let reminder_time = match task.due_at {
            Some(due_at) => due_at,
            None => TimeDelta::try_minutes(default_offset_minutes)
                .and_then(|offset| now.checked_add_signed(offset))
                .ok_or_else(|| {
                    ReminderError::validation(format!(
                        "default offset of {default_offset_minutes} minutes is out of range"
                    ))
                })?,
        };
        Ok(Self::new(task, reminder_time))
    }

    pub fn task_id(&self) -> &str {
        &self.task.task_id
    }
}
