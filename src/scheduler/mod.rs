//! # Reminder Scheduling
//!
//! Turns reminder requests into delayed deliveries.
//!
//! - [`delay`]: trigger time to wait duration
//! - [`dispatcher`]: rendering and sending the reminder text
//! - [`durable`]: pgmq-backed delayed jobs with a polling worker
//! - [`in_memory`]: process-local timers used as the offline fallback
//! - [`engine`]: [`ReminderScheduler`], choosing and driving one of the above

pub mod backend;
pub mod delay;
pub mod dispatcher;
pub mod durable;
pub mod engine;
pub mod in_memory;

pub use backend::{ReminderBackend, ReminderHandle, ScheduledEntry, SchedulerMode};
pub use delay::{calculate_delay, calculate_delay_from, calculate_delay_str};
pub use dispatcher::{build_message_text, LineDispatcher, ReminderDispatcher};
pub use durable::PgmqReminderBackend;
pub use engine::ReminderScheduler;
pub use in_memory::InMemoryBackend;
