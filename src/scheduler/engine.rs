//! # Reminder Scheduler
//!
//! Mode-aware scheduling engine. Exactly one backend is active at a time:
//! the durable queue when it can be built and initialized, otherwise the
//! in-process timers when offline fallback is enabled.
//!
//! The switch to in-memory mode happens only at construction or during
//! `initialize`. Failures of individual schedule/cancel calls are reported to
//! the caller and never change the mode.

use super::backend::{ReminderBackend, SchedulerMode};
use super::delay::calculate_delay;
use super::dispatcher::ReminderDispatcher;
use super::durable::PgmqReminderBackend;
use super::in_memory::InMemoryBackend;
use crate::config::ReminderConfig;
use crate::error::{ReminderError, Result};
use crate::logging::{log_error, log_reminder_operation};
use crate::models::ReminderRequest;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

#[derive(Debug)]
pub struct ReminderScheduler {
    backend: RwLock<Box<dyn ReminderBackend>>,
    dispatcher: Arc<dyn ReminderDispatcher>,
    enable_offline_fallback: bool,
    initialized: AtomicBool,
    stopped: AtomicBool,
}

impl ReminderScheduler {
    /// Build a scheduler from configuration, trying the durable queue first
    pub fn new(config: &ReminderConfig, dispatcher: Arc<dyn ReminderDispatcher>) -> Result<Self> {
        let durable = PgmqReminderBackend::new(&config.database, &config.queue, Arc::clone(&dispatcher))
            .map(|backend| Box::new(backend) as Box<dyn ReminderBackend>)
            .map_err(ReminderError::from);
        Self::with_durable_backend(durable, config.scheduler.enable_offline_fallback, dispatcher)
    }

    /// Build a scheduler around an already constructed (or failed) durable
    /// backend
    pub fn with_durable_backend(
        durable: Result<Box<dyn ReminderBackend>>,
        enable_offline_fallback: bool,
        dispatcher: Arc<dyn ReminderDispatcher>,
    ) -> Result<Self> {
        let backend = match durable {
            Ok(backend) => backend,
            Err(e) if enable_offline_fallback => {
                warn!(
                    error = %e,
                    "⚠️ Durable reminder queue unavailable, using in-memory timers"
                );
                Box::new(InMemoryBackend::new(Arc::clone(&dispatcher)))
            }
            Err(e) => {
                log_error("scheduler", "construct", &e.to_string(), Some("offline fallback disabled"));
                return Err(e);
            }
        };

        Ok(Self::from_backend(backend, enable_offline_fallback, dispatcher))
    }

    /// Scheduler that only ever uses in-process timers
    pub fn in_memory(dispatcher: Arc<dyn ReminderDispatcher>) -> Self {
        let backend = Box::new(InMemoryBackend::new(Arc::clone(&dispatcher)));
        Self::from_backend(backend, true, dispatcher)
    }

    fn from_backend(
        backend: Box<dyn ReminderBackend>,
        enable_offline_fallback: bool,
        dispatcher: Arc<dyn ReminderDispatcher>,
    ) -> Self {
        Self {
            backend: RwLock::new(backend),
            dispatcher,
            enable_offline_fallback,
            initialized: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    pub async fn mode(&self) -> SchedulerMode {
        self.backend.read().await.mode()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Start the active backend. Calling again after success is a no-op.
    ///
    /// A durable backend that fails to start is replaced by in-memory timers
    /// when fallback is enabled; otherwise the failure is returned.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        if self.is_stopped() {
            return Err(ReminderError::SchedulerStopped);
        }

        let mut backend = self.backend.write().await;
        if self.is_initialized() {
            return Ok(());
        }

        if let Err(e) = backend.initialize().await {
            if backend.mode() != SchedulerMode::Durable || !self.enable_offline_fallback {
                log_error("scheduler", "initialize", &e.to_string(), None);
                return Err(e);
            }

            warn!(
                error = %e,
                "⚠️ Durable reminder queue failed to start, falling back to in-memory timers"
            );
            if let Err(cleanup) = backend.shutdown().await {
                warn!("Discarding partially started durable backend failed: {}", cleanup);
            }
            let mut fallback: Box<dyn ReminderBackend> =
                Box::new(InMemoryBackend::new(Arc::clone(&self.dispatcher)));
            fallback.initialize().await?;
            *backend = fallback;
        }

        self.initialized.store(true, Ordering::Release);
        info!(mode = %backend.mode(), "✅ Reminder scheduler initialized");
        Ok(())
    }

    /// Replace any pending reminder for the task with one firing at
    /// `request.reminder_time`
    pub async fn schedule_reminder(&self, request: &ReminderRequest) -> Result<()> {
        if self.is_stopped() {
            return Err(ReminderError::SchedulerStopped);
        }

        let backend = self.backend.read().await;
        // shutdown may have completed while this call waited for the lock
        if self.is_stopped() {
            return Err(ReminderError::SchedulerStopped);
        }
        let task_id = request.task_id();
        let mode = backend.mode();

        let result = async {
            backend.cancel(task_id).await?;
            let delay = calculate_delay(request.reminder_time);
            backend.schedule(request, delay).await
        }
        .await;

        if let Err(e) = &result {
            log_reminder_operation("schedule", task_id, mode.as_str(), "failed", Some(&e.to_string()));
        }
        result
    }

    /// `true` when a pending reminder was removed
    pub async fn cancel_reminder(&self, task_id: &str) -> Result<bool> {
        if self.is_stopped() {
            return Ok(false);
        }

        let backend = self.backend.read().await;
        let removed = backend.cancel(task_id).await?;
        if removed {
            log_reminder_operation("cancel", task_id, backend.mode().as_str(), "removed", None);
        }
        Ok(removed)
    }

    pub async fn pending_count(&self) -> Result<usize> {
        self.backend.read().await.pending_count().await
    }

    /// Stop timers and release the backend. Later calls return immediately.
    pub async fn shutdown(&self) -> Result<()> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let mut backend = self.backend.write().await;
        let mode = backend.mode();
        backend.shutdown().await?;
        info!(mode = %mode, "🛑 Reminder scheduler shut down");
        Ok(())
    }
}
