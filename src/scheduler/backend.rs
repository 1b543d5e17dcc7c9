//! Backend seam shared by the durable queue and the in-process timer modes.

use crate::error::Result;
use crate::models::ReminderRequest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::task::AbortHandle;

/// Which scheduling backend is in effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerMode {
    Durable,
    InMemory,
}

impl SchedulerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Durable => "durable",
            Self::InMemory => "in_memory",
        }
    }
}

impl fmt::Display for SchedulerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to the mechanism that will fire a reminder. A handle is always of
/// the kind matching the backend that created it.
#[derive(Debug)]
pub enum ReminderHandle {
    /// Delayed job in the durable queue
    Job { message_id: i64 },
    /// In-process timer; `generation` tells a superseded timer from the
    /// current one
    Timer { generation: u64, abort: AbortHandle },
}

impl ReminderHandle {
    /// Stop the underlying mechanism where the handle alone can do so
    pub fn release(&self) {
        if let Self::Timer { abort, .. } = self {
            abort.abort();
        }
    }
}

/// One pending reminder in an entry table
#[derive(Debug)]
pub struct ScheduledEntry {
    pub handle: ReminderHandle,
    pub reminder_time: DateTime<Utc>,
}

impl ScheduledEntry {
    pub fn job(message_id: i64, reminder_time: DateTime<Utc>) -> Self {
        Self {
            handle: ReminderHandle::Job { message_id },
            reminder_time,
        }
    }

    pub fn timer(generation: u64, abort: AbortHandle, reminder_time: DateTime<Utc>) -> Self {
        Self {
            handle: ReminderHandle::Timer { generation, abort },
            reminder_time,
        }
    }

    pub fn message_id(&self) -> Option<i64> {
        match self.handle {
            ReminderHandle::Job { message_id } => Some(message_id),
            ReminderHandle::Timer { .. } => None,
        }
    }

    pub fn generation(&self) -> Option<u64> {
        match self.handle {
            ReminderHandle::Timer { generation, .. } => Some(generation),
            ReminderHandle::Job { .. } => None,
        }
    }
}

/// Task id to pending entry; at most one entry per task
pub type EntryTable = DashMap<String, ScheduledEntry>;

/// A place reminders can be scheduled and cancelled
#[async_trait]
pub trait ReminderBackend: Send + Sync + fmt::Debug {
    fn mode(&self) -> SchedulerMode;

    /// Acquire resources and start background work. Must be safe to call on
    /// an already initialized backend.
    async fn initialize(&mut self) -> Result<()>;

    /// Register a reminder that fires after `delay`. The caller has already
    /// cancelled any previous reminder for the task.
    async fn schedule(&self, request: &ReminderRequest, delay: Duration) -> Result<()>;

    /// Remove the pending reminder for `task_id`. `false` when there was none
    /// or it already fired.
    async fn cancel(&self, task_id: &str) -> Result<bool>;

    async fn pending_count(&self) -> Result<usize>;

    /// Release every resource; pending reminders stop firing
    async fn shutdown(&mut self) -> Result<()>;
}
