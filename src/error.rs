//! # Error Types
//!
//! Crate-level error type. Component errors (queue, delivery, configuration)
//! keep their own structured enums and convert into [`ReminderError`] at the
//! boundaries where callers only care about the category.

use crate::channel::DeliveryError;
use crate::config::ConfigurationError;
use crate::messaging::MessagingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Queue error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("Scheduling error for task {task_id}: {message}")]
    Scheduling { task_id: String, message: String },

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Scheduler is shut down")]
    SchedulerStopped,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReminderError {
    pub fn scheduling(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scheduling {
            task_id: task_id.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<sqlx::Error> for ReminderError {
    fn from(err: sqlx::Error) -> Self {
        ReminderError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for ReminderError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        ReminderError::Database(format!("migration failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, ReminderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduling_error_display() {
        let err = ReminderError::scheduling("task-1", "queue rejected job");
        let display = format!("{err}");
        assert!(display.contains("task-1"));
        assert!(display.contains("queue rejected job"));
    }

    #[test]
    fn test_messaging_error_conversion() {
        let err: ReminderError = MessagingError::database_connection("refused").into();
        assert!(matches!(err, ReminderError::Messaging(_)));
        assert!(format!("{err}").contains("refused"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: ReminderError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, ReminderError::Database(_)));
    }
}
