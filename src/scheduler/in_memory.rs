//! # In-Memory Backend
//!
//! Process-local timers used when the durable queue is unavailable. Pending
//! reminders are lost on restart.
//!
//! Each timer removes its own table entry before delivering, but only while
//! the entry still carries its generation. A timer that was superseded by a
//! reschedule therefore never touches the newer entry.

use super::backend::{EntryTable, ReminderBackend, ScheduledEntry, SchedulerMode};
use super::dispatcher::ReminderDispatcher;
use crate::error::Result;
use crate::logging::{log_delivery_operation, log_reminder_operation};
use crate::models::ReminderRequest;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub struct InMemoryBackend {
    entries: Arc<EntryTable>,
    dispatcher: Arc<dyn ReminderDispatcher>,
    next_generation: AtomicU64,
}

impl InMemoryBackend {
    pub fn new(dispatcher: Arc<dyn ReminderDispatcher>) -> Self {
        Self {
            entries: Arc::new(EntryTable::new()),
            dispatcher,
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn is_scheduled(&self, task_id: &str) -> bool {
        self.entries.contains_key(task_id)
    }
}

#[async_trait]
impl ReminderBackend for InMemoryBackend {
    fn mode(&self) -> SchedulerMode {
        SchedulerMode::InMemory
    }

    async fn initialize(&mut self) -> Result<()> {
        debug!("In-memory reminder backend ready");
        Ok(())
    }

    async fn schedule(&self, request: &ReminderRequest, delay: Duration) -> Result<()> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let task_id = request.task_id().to_string();

        // The shard stays locked until the entry is stored, so a zero-delay
        // timer cannot look for its entry before it exists.
        let slot = self.entries.entry(task_id.clone());

        let entries = Arc::clone(&self.entries);
        let dispatcher = Arc::clone(&self.dispatcher);
        let task = request.task.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let claimed = entries
                .remove_if(&task.task_id, |_, entry| {
                    entry.generation() == Some(generation)
                })
                .is_some();
            if !claimed {
                return;
            }

            match dispatcher.dispatch_task_reminder(&task).await {
                Ok(()) => log_reminder_operation(
                    "fire",
                    &task.task_id,
                    SchedulerMode::InMemory.as_str(),
                    "completed",
                    None,
                ),
                Err(e) => log_delivery_operation(
                    &task.task_id,
                    &task.user_id,
                    "failed",
                    Some(&e.to_string()),
                ),
            }
        });

        let entry = ScheduledEntry::timer(generation, timer.abort_handle(), request.reminder_time);
        match slot {
            Entry::Occupied(mut occupied) => {
                occupied.get().handle.release();
                occupied.insert(entry);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
            }
        }

        log_reminder_operation(
            "schedule",
            &task_id,
            SchedulerMode::InMemory.as_str(),
            "registered",
            Some(&format!("delay_ms={}", delay.as_millis())),
        );
        Ok(())
    }

    async fn cancel(&self, task_id: &str) -> Result<bool> {
        match self.entries.remove(task_id) {
            Some((_, entry)) => {
                entry.handle.release();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pending_count(&self) -> Result<usize> {
        Ok(self.entries.len())
    }

    async fn shutdown(&mut self) -> Result<()> {
        let mut released = 0usize;
        self.entries.retain(|_, entry| {
            entry.handle.release();
            released += 1;
            false
        });
        debug!(released, "In-memory reminder backend stopped");
        Ok(())
    }
}
