use async_trait::async_trait;
use reminder_core::channel::DeliveryError;
use reminder_core::messaging::MessagingError;
use reminder_core::models::{ReminderRequest, Task};
use reminder_core::scheduler::{ReminderBackend, ReminderDispatcher, SchedulerMode};
use reminder_core::Result;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// One recorded delivery
#[derive(Debug, Clone)]
pub struct Delivery {
    pub task_id: String,
    pub user_id: String,
    pub text: String,
    pub at: Instant,
}

/// Dispatcher that records every delivery instead of sending it
#[derive(Debug)]
pub struct RecordingDispatcher {
    closing_phrase: String,
    deliveries: Mutex<Vec<Delivery>>,
    fail_with_status: Option<u16>,
}

impl RecordingDispatcher {
    pub fn new(closing_phrase: &str) -> Arc<Self> {
        Arc::new(Self {
            closing_phrase: closing_phrase.to_string(),
            deliveries: Mutex::new(Vec::new()),
            fail_with_status: None,
        })
    }

    /// Records the attempt, then fails it with `status`
    pub fn failing(closing_phrase: &str, status: u16) -> Arc<Self> {
        Arc::new(Self {
            closing_phrase: closing_phrase.to_string(),
            deliveries: Mutex::new(Vec::new()),
            fail_with_status: Some(status),
        })
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn delivered_ids(&self) -> Vec<String> {
        self.deliveries().into_iter().map(|d| d.task_id).collect()
    }
}

#[async_trait]
impl ReminderDispatcher for RecordingDispatcher {
    async fn dispatch_task_reminder(&self, task: &Task) -> std::result::Result<(), DeliveryError> {
        let text = reminder_core::scheduler::build_message_text(task, &self.closing_phrase);
        self.deliveries.lock().unwrap().push(Delivery {
            task_id: task.task_id.clone(),
            user_id: task.user_id.clone(),
            text,
            at: Instant::now(),
        });
        match self.fail_with_status {
            Some(status) => Err(DeliveryError::status(status, "rejected")),
            None => Ok(()),
        }
    }
}

/// Durable-mode backend whose connection never comes up
#[derive(Debug, Default)]
pub struct UnreachableDurableBackend {
    pub shutdown_calls: Arc<Mutex<usize>>,
}

fn refused() -> reminder_core::ReminderError {
    MessagingError::database_connection("connection refused").into()
}

#[async_trait]
impl ReminderBackend for UnreachableDurableBackend {
    fn mode(&self) -> SchedulerMode {
        SchedulerMode::Durable
    }

    async fn initialize(&mut self) -> Result<()> {
        Err(refused())
    }

    async fn schedule(&self, _request: &ReminderRequest, _delay: Duration) -> Result<()> {
        Err(refused())
    }

    async fn cancel(&self, _task_id: &str) -> Result<bool> {
        Err(refused())
    }

    async fn pending_count(&self) -> Result<usize> {
        Err(refused())
    }

    async fn shutdown(&mut self) -> Result<()> {
        *self.shutdown_calls.lock().unwrap() += 1;
        Ok(())
    }
}
