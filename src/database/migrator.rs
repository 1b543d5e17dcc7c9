//! # Database Migration Support
//!
//! Schema for the task store lives in `migrations/` at the crate root. The
//! reminder queue tables are created by pgmq itself when the queue is first
//! created, so they are not part of these migrations.
//!
//! ## Usage
//! ```rust,ignore
//! #[sqlx::test(migrator = "reminder_core::database::migrator::MIGRATOR")]
//! async fn test_feature(pool: PgPool) { /* ... */ }
//! ```

use sqlx::PgPool;
use tracing::info;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Result type for migration operations
pub type MigrationResult<T> = Result<T, sqlx::migrate::MigrateError>;

/// Apply outstanding migrations to the task store database
pub async fn run_migrations(pool: &PgPool) -> MigrationResult<()> {
    info!("Running task store migrations...");
    MIGRATOR.run(pool).await?;
    info!("Task store migrations complete");
    Ok(())
}
