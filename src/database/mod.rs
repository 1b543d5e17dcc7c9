//! # Database Operations
//!
//! Task persistence and schema migrations.
//!
//! - [`task_store`] - [`TaskStore`] with PostgreSQL and in-memory implementations
//! - [`migrator`] - embedded migrations for the `reminder_tasks` table

pub mod migrator;
pub mod task_store;

pub use migrator::{run_migrations, MigrationResult, MIGRATOR};
pub use task_store::{InMemoryTaskStore, PgTaskStore, TaskStore};
