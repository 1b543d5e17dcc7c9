//! # Durable Backend
//!
//! Reminders become delayed jobs in a pgmq queue and survive process restarts.
//! A worker loop polls the queue, delivers each visible job, and deletes it
//! whether delivery succeeded or failed.
//!
//! The local entry table remembers the latest job id per task. It lets the
//! worker drop an already-visible job that a later schedule call replaced;
//! cancellation and counts always go to the queue itself.

use super::backend::{EntryTable, ReminderBackend, ScheduledEntry, SchedulerMode};
use super::delay::delay_in_whole_seconds;
use super::dispatcher::ReminderDispatcher;
use crate::config::{DatabaseConfig, QueueConfig};
use crate::error::Result;
use crate::logging::{log_delivery_operation, log_error, log_reminder_operation};
use crate::messaging::{
    validate_queue_name, MessagingError, MessagingResult, PgmqClient, QueueConnectionSettings,
    ReminderJobMessage,
};
use crate::models::ReminderRequest;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use pgmq::types::Message;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

#[derive(Debug)]
struct QueueWorker {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
pub struct PgmqReminderBackend {
    settings: QueueConnectionSettings,
    queue: QueueConfig,
    dispatcher: Arc<dyn ReminderDispatcher>,
    entries: Arc<EntryTable>,
    client: Option<PgmqClient>,
    worker: Option<QueueWorker>,
}

impl PgmqReminderBackend {
    /// Validate connection settings and queue name without touching the network
    pub fn new(
        database: &DatabaseConfig,
        queue: &QueueConfig,
        dispatcher: Arc<dyn ReminderDispatcher>,
    ) -> MessagingResult<Self> {
        let settings = QueueConnectionSettings::parse(&database.url, database.max_connections)?;
        validate_queue_name(&queue.name)?;

        Ok(Self {
            settings,
            queue: queue.clone(),
            dispatcher,
            entries: Arc::new(EntryTable::new()),
            client: None,
            worker: None,
        })
    }

    pub fn queue_name(&self) -> &str {
        &self.queue.name
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn client(&self) -> MessagingResult<&PgmqClient> {
        self.client
            .as_ref()
            .ok_or_else(|| MessagingError::WorkerNotRunning {
                queue_name: self.queue.name.clone(),
            })
    }
}

#[async_trait]
impl ReminderBackend for PgmqReminderBackend {
    fn mode(&self) -> SchedulerMode {
        SchedulerMode::Durable
    }

    #[instrument(skip(self), fields(queue = %self.queue.name))]
    async fn initialize(&mut self) -> Result<()> {
        if self.client.is_some() {
            return Ok(());
        }

        let client = PgmqClient::connect(&self.settings).await?;
        if let Err(e) = client.create_queue(&self.queue.name).await {
            client.close().await;
            return Err(e.into());
        }

        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_worker(
            client.clone(),
            self.queue.clone(),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.entries),
            stop_rx,
        ));

        self.client = Some(client);
        self.worker = Some(QueueWorker { stop, handle });
        info!(queue = %self.queue.name, "✅ Durable reminder worker started");
        Ok(())
    }

    async fn schedule(&self, request: &ReminderRequest, delay: Duration) -> Result<()> {
        let client = self.client()?;
        let delay_seconds = delay_in_whole_seconds(delay);
        let job = ReminderJobMessage::new(request.task.clone(), request.reminder_time);

        let message_id = client
            .send_delayed(&self.queue.name, &job, delay_seconds)
            .await?;
        self.entries.insert(
            request.task_id().to_string(),
            ScheduledEntry::job(message_id, request.reminder_time),
        );

        log_reminder_operation(
            "schedule",
            request.task_id(),
            SchedulerMode::Durable.as_str(),
            "enqueued",
            Some(&format!("message_id={message_id} delay_seconds={delay_seconds}")),
        );
        Ok(())
    }

    async fn cancel(&self, task_id: &str) -> Result<bool> {
        let client = self.client()?;
        let removed = client
            .delete_pending_for_task(&self.queue.name, task_id)
            .await?;
        self.entries.remove(task_id);
        Ok(removed > 0)
    }

    async fn pending_count(&self) -> Result<usize> {
        let count = self.client()?.pending_count(&self.queue.name).await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn shutdown(&mut self) -> Result<()> {
        let worker = self.worker.take();
        let client = self.client.take();

        let stop_worker = async move {
            if let Some(worker) = worker {
                let _ = worker.stop.send(true);
                if let Err(e) = worker.handle.await {
                    warn!("Reminder worker ended abnormally: {}", e);
                }
            }
        };
        let close_pool = async {
            if let Some(client) = &client {
                client.close().await;
            }
        };
        tokio::join!(stop_worker, close_pool);

        self.entries.clear();
        info!(queue = %self.queue.name, "🛑 Durable reminder backend stopped");
        Ok(())
    }
}

async fn run_worker(
    client: PgmqClient,
    queue: QueueConfig,
    dispatcher: Arc<dyn ReminderDispatcher>,
    entries: Arc<EntryTable>,
    mut stop: watch::Receiver<bool>,
) {
    debug!(queue = %queue.name, "Reminder worker polling");
    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = tokio::time::sleep(queue.poll_interval()) => {}
        }

        let messages = match client
            .read_messages(
                &queue.name,
                Some(queue.visibility_timeout_seconds),
                queue.batch_size,
            )
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                warn!(queue = %queue.name, "Failed to read reminder jobs: {}", e);
                continue;
            }
        };

        join_all(
            messages
                .into_iter()
                .map(|message| process_job(&client, &queue.name, dispatcher.as_ref(), &entries, message)),
        )
        .await;
    }
    debug!(queue = %queue.name, "Reminder worker exiting");
}

async fn process_job(
    client: &PgmqClient,
    queue_name: &str,
    dispatcher: &dyn ReminderDispatcher,
    entries: &EntryTable,
    message: Message<serde_json::Value>,
) {
    let message_id = message.msg_id;
    deliver_job(dispatcher, entries, message_id, message.message).await;

    if let Err(e) = client.delete_message(queue_name, message_id).await {
        warn!(message_id, "Failed to remove processed reminder job: {}", e);
    }
}

/// Deliver one job payload. Returns `true` when the dispatcher was invoked.
///
/// A job is skipped when this process has since enqueued a different job for
/// the same task; a job with no local entry (e.g. enqueued before a restart)
/// is delivered.
async fn deliver_job(
    dispatcher: &dyn ReminderDispatcher,
    entries: &EntryTable,
    message_id: i64,
    payload: serde_json::Value,
) -> bool {
    let job = match serde_json::from_value::<ReminderJobMessage>(payload) {
        Ok(job) => job,
        Err(e) => {
            log_error(
                "reminder_worker",
                "decode_job",
                &e.to_string(),
                Some(&format!("message_id={message_id}")),
            );
            return false;
        }
    };

    if let Some(newer) = entries
        .get(&job.task_id)
        .filter(|entry| entry.message_id() != Some(message_id))
    {
        debug!(
            task_id = %job.task_id,
            message_id,
            replaced_by = ?newer.message_id(),
            reminder_time = %newer.reminder_time,
            "Skipping superseded reminder job"
        );
        return false;
    }
    entries.remove_if(&job.task_id, |_, entry| entry.message_id() == Some(message_id));

    let lateness = job.lateness_seconds(Utc::now());
    match dispatcher.dispatch_task_reminder(&job.task).await {
        Ok(()) => log_reminder_operation(
            "fire",
            &job.task_id,
            SchedulerMode::Durable.as_str(),
            "completed",
            Some(&format!("message_id={message_id} late_by_seconds={lateness}")),
        ),
        Err(e) => log_delivery_operation(
            &job.task_id,
            &job.task.user_id,
            "failed",
            Some(&e.to_string()),
        ),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::DeliveryError;
    use crate::models::Task;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recorder {
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReminderDispatcher for Recorder {
        async fn dispatch_task_reminder(&self, task: &Task) -> std::result::Result<(), DeliveryError> {
            self.delivered.lock().unwrap().push(task.task_id.clone());
            Ok(())
        }
    }

    fn job_payload(task_id: &str) -> serde_json::Value {
        let task = Task::with_id(task_id, "U1", "Feed cat", None);
        serde_json::to_value(ReminderJobMessage::new(task, Utc::now())).unwrap()
    }

    #[tokio::test]
    async fn test_job_with_unreadable_time_is_delivered() {
        let recorder = Recorder::default();
        let entries = EntryTable::new();
        let mut payload = job_payload("t1");
        payload["reminder_time"] = serde_json::json!("not-a-timestamp");

        assert!(deliver_job(&recorder, &entries, 7, payload).await);
        assert_eq!(*recorder.delivered.lock().unwrap(), vec!["t1".to_string()]);
    }

    #[tokio::test]
    async fn test_undecodable_job_is_not_delivered() {
        let recorder = Recorder::default();
        let entries = EntryTable::new();

        assert!(!deliver_job(&recorder, &entries, 7, serde_json::json!({ "task_id": 5 })).await);
        assert!(recorder.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_superseded_job_is_skipped() {
        let recorder = Recorder::default();
        let entries = EntryTable::new();
        entries.insert("t1".to_string(), ScheduledEntry::job(2, Utc::now()));

        assert!(!deliver_job(&recorder, &entries, 1, job_payload("t1")).await);
        assert!(recorder.delivered.lock().unwrap().is_empty());
        assert!(entries.contains_key("t1"));

        assert!(deliver_job(&recorder, &entries, 2, job_payload("t1")).await);
        assert!(!entries.contains_key("t1"));

        // Jobs enqueued before a restart have no local entry
        assert!(deliver_job(&recorder, &entries, 3, job_payload("t2")).await);
        assert_eq!(
            *recorder.delivered.lock().unwrap(),
            vec!["t1".to_string(), "t2".to_string()]
        );
    }

    #[test]
    fn test_construction_rejects_bad_settings() {
        let dispatcher = Arc::new(Recorder::default());

        let database = DatabaseConfig {
            url: "definitely not a url".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(PgmqReminderBackend::new(&database, &QueueConfig::default(), dispatcher.clone()).is_err());

        let queue = QueueConfig {
            name: "Has Spaces".to_string(),
            ..QueueConfig::default()
        };
        let err = PgmqReminderBackend::new(&DatabaseConfig::default(), &queue, dispatcher).unwrap_err();
        assert!(matches!(err, MessagingError::InvalidQueueName { .. }));
    }

    #[tokio::test]
    async fn test_operations_require_initialize() {
        let dispatcher = Arc::new(Recorder::default());
        let backend =
            PgmqReminderBackend::new(&DatabaseConfig::default(), &QueueConfig::default(), dispatcher)
                .unwrap();
        assert!(!backend.is_running());

        let request = ReminderRequest::new(Task::with_id("t1", "U1", "x", None), Utc::now());
        assert!(backend.schedule(&request, Duration::ZERO).await.is_err());
        assert!(backend.cancel("t1").await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_without_initialize_is_harmless() {
        let dispatcher = Arc::new(Recorder::default());
        let mut backend =
            PgmqReminderBackend::new(&DatabaseConfig::default(), &QueueConfig::default(), dispatcher)
                .unwrap();
        backend.shutdown().await.unwrap();
        backend.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_durable_round_trip_against_database() {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            println!("Skipping durable backend test - TEST_DATABASE_URL not set");
            return;
        };

        let dispatcher = Arc::new(Recorder::default());
        let database = DatabaseConfig {
            url,
            ..DatabaseConfig::default()
        };
        let queue = QueueConfig {
            name: format!("reminder_test_{}", std::process::id()),
            poll_interval_ms: 100,
            ..QueueConfig::default()
        };
        let mut backend = PgmqReminderBackend::new(&database, &queue, dispatcher.clone()).unwrap();
        backend.initialize().await.unwrap();
        backend.initialize().await.unwrap();

        let later = ReminderRequest::new(Task::with_id("later", "U1", "later", None), Utc::now());
        backend.schedule(&later, Duration::from_secs(3600)).await.unwrap();
        assert_eq!(backend.pending_count().await.unwrap(), 1);
        assert!(backend.cancel("later").await.unwrap());
        assert!(!backend.cancel("later").await.unwrap());
        assert_eq!(backend.pending_count().await.unwrap(), 0);

        let now = ReminderRequest::new(Task::with_id("now", "U1", "now", None), Utc::now());
        backend.schedule(&now, Duration::ZERO).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(*dispatcher.delivered.lock().unwrap(), vec!["now".to_string()]);

        backend.shutdown().await.unwrap();
    }
}
