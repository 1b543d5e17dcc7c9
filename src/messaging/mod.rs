//! # Messaging Module
//!
//! PostgreSQL message queue (pgmq) based storage for durable reminder jobs.

pub mod errors;
pub mod message;
pub mod pgmq_client;

pub use errors::{MessagingError, MessagingResult};
pub use message::ReminderJobMessage;
pub use pgmq_client::{validate_queue_name, PgmqClient, QueueConnectionSettings};
