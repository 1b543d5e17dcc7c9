//! # Models
//!
//! Data types shared by the webhook adapter, the task store and the scheduler.

pub mod task;

pub use task::{ReminderRequest, Task, TaskPriority, TaskStatus};
