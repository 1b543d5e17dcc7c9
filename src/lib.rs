#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Reminder Core
//!
//! Task reminders for a chat assistant. Users send a task over the messaging
//! platform; the service stores it, schedules a reminder for its due time (or
//! a default offset), and pushes a friendly message when the reminder fires.
//!
//! ## Architecture
//!
//! Reminders are scheduled in one of two modes:
//!
//! - **Durable**: delayed jobs in a PostgreSQL message queue (pgmq) consumed
//!   by a polling worker; pending reminders survive restarts.
//! - **In-memory**: tokio timers inside the process, used when the queue is
//!   unavailable and offline fallback is enabled.
//!
//! At most one reminder is pending per task; scheduling again replaces it.
//!
//! ## Module Organization
//!
//! - [`scheduler`] - Scheduling engine, backends, delay calculation, dispatcher
//! - [`channel`] - Webhook verification and parsing, outbound push client
//! - [`messaging`] - pgmq client and reminder job payloads
//! - [`database`] - Task store and migrations
//! - [`web`] - Axum routes and handlers
//! - [`bootstrap`] - Wiring and lifecycle of the running service
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::{Duration, Utc};
//! use reminder_core::models::{ReminderRequest, Task};
//! use reminder_core::scheduler::{ReminderDispatcher, ReminderScheduler};
//! use std::sync::Arc;
//!
//! # async fn example(dispatcher: Arc<dyn ReminderDispatcher>) -> reminder_core::Result<()> {
//! let scheduler = ReminderScheduler::in_memory(dispatcher);
//! scheduler.initialize().await?;
//!
//! let task = Task::new("U123", "Submit report", Some(Utc::now() + Duration::hours(2)));
//! scheduler.schedule_reminder(&ReminderRequest::for_task(task, 60)?).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! Database-backed tests run when `TEST_DATABASE_URL` is set and are skipped
//! otherwise.

pub mod bootstrap;
pub mod channel;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod scheduler;
pub mod web;

pub use bootstrap::ReminderSystem;
pub use config::{ConfigManager, ReminderConfig};
pub use error::{ReminderError, Result};
pub use models::{ReminderRequest, Task, TaskPriority, TaskStatus};
pub use scheduler::{ReminderScheduler, SchedulerMode};
