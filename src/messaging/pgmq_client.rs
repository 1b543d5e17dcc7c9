//! # PostgreSQL Message Queue Client (pgmq-rs)
//!
//! Reminder queue client built on the pgmq-rs crate. Delayed jobs use the
//! message visibility timeout as the fire time; jobs are addressed by the
//! `task_id` field of their JSON payload so they can be found again after a
//! process restart.

use crate::constants::queue::{DEFAULT_CONNECT_TIMEOUT_SECONDS, MAX_QUEUE_NAME_LENGTH};
use crate::messaging::{MessagingError, MessagingResult, ReminderJobMessage};
use pgmq::{types::Message, PGMQueue};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Connection settings parsed from a PostgreSQL URL.
///
/// Parsing happens eagerly so malformed host/port/credential/TLS parameters
/// are reported before any network activity.
#[derive(Debug, Clone)]
pub struct QueueConnectionSettings {
    options: PgConnectOptions,
    max_connections: u32,
    connect_timeout: Duration,
}

impl QueueConnectionSettings {
    pub fn parse(database_url: &str, max_connections: u32) -> MessagingResult<Self> {
        if database_url.trim().is_empty() {
            return Err(MessagingError::configuration(
                "pgmq",
                "database URL must not be empty",
            ));
        }

        let options = PgConnectOptions::from_str(database_url)
            .map_err(|e| MessagingError::configuration("pgmq", format!("invalid database URL: {e}")))?;

        Ok(Self {
            options,
            max_connections: max_connections.max(1),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS),
        })
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        self.options.get_host()
    }

    pub fn port(&self) -> u16 {
        self.options.get_port()
    }
}

/// Validate a pgmq queue name; it becomes part of a table name
pub fn validate_queue_name(queue_name: &str) -> MessagingResult<()> {
    if queue_name.is_empty() {
        return Err(MessagingError::invalid_queue_name(queue_name, "must not be empty"));
    }
    if queue_name.len() > MAX_QUEUE_NAME_LENGTH {
        return Err(MessagingError::invalid_queue_name(
            queue_name,
            format!("must be at most {MAX_QUEUE_NAME_LENGTH} characters"),
        ));
    }
    let mut chars = queue_name.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    if !first_ok || !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(MessagingError::invalid_queue_name(
            queue_name,
            "only lowercase letters, digits and underscores are allowed",
        ));
    }
    Ok(())
}

/// pgmq-rs based reminder queue client
#[derive(Debug, Clone)]
pub struct PgmqClient {
    pgmq: PGMQueue,
}

impl PgmqClient {
    /// Connect using pre-parsed connection settings
    pub async fn connect(settings: &QueueConnectionSettings) -> MessagingResult<Self> {
        info!(
            host = %settings.host(),
            port = settings.port(),
            "🚀 Connecting to pgmq using pgmq-rs crate"
        );

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.connect_timeout)
            .connect_with(settings.options.clone())
            .await?;

        let pgmq = PGMQueue::new_with_pool(pool).await;

        info!("✅ Connected to pgmq using pgmq-rs");
        Ok(Self { pgmq })
    }

    /// Create new pgmq client using existing connection pool (BYOP - Bring Your Own Pool)
    pub async fn new_with_pool(pool: sqlx::PgPool) -> Self {
        info!("🚀 Creating pgmq client with shared connection pool");
        let pgmq = PGMQueue::new_with_pool(pool).await;
        Self { pgmq }
    }

    /// Create queue if it doesn't exist
    #[instrument(skip(self), fields(queue = %queue_name))]
    pub async fn create_queue(&self, queue_name: &str) -> MessagingResult<()> {
        validate_queue_name(queue_name)?;
        debug!("📋 Creating queue: {}", queue_name);

        self.pgmq
            .create(queue_name)
            .await
            .map_err(|e| MessagingError::from(e).in_queue(queue_name, "create"))?;

        info!("✅ Queue ready: {}", queue_name);
        Ok(())
    }

    /// Send a reminder job that becomes visible after `delay_seconds`
    #[instrument(skip(self, message), fields(queue = %queue_name, task_id = %message.task_id))]
    pub async fn send_delayed(
        &self,
        queue_name: &str,
        message: &ReminderJobMessage,
        delay_seconds: u64,
    ) -> MessagingResult<i64> {
        debug!(
            "📤 Sending delayed reminder to queue: {} with delay: {}s",
            queue_name, delay_seconds
        );

        let serialized = serde_json::to_value(message)?;
        let message_id = self
            .pgmq
            .send_delay(queue_name, &serialized, delay_seconds)
            .await
            .map_err(|e| MessagingError::from(e).in_queue(queue_name, "send_delay"))?;

        info!(
            "✅ Reminder job sent to queue: {} with id: {}",
            queue_name, message_id
        );
        Ok(message_id)
    }

    /// Read visible jobs, hiding them for `visibility_timeout` seconds
    #[instrument(skip(self), fields(queue = %queue_name))]
    pub async fn read_messages(
        &self,
        queue_name: &str,
        visibility_timeout: Option<i32>,
        limit: i32,
    ) -> MessagingResult<Vec<Message<serde_json::Value>>> {
        let messages = self
            .pgmq
            .read_batch::<serde_json::Value>(queue_name, visibility_timeout, limit)
            .await
            .map_err(|e| MessagingError::from(e).in_queue(queue_name, "read_batch"))?
            .unwrap_or_default();

        if !messages.is_empty() {
            debug!(
                "📨 Read {} messages from queue: {}",
                messages.len(),
                queue_name
            );
        }
        Ok(messages)
    }

    /// Delete message from queue
    #[instrument(skip(self), fields(queue = %queue_name, message_id = %message_id))]
    pub async fn delete_message(&self, queue_name: &str, message_id: i64) -> MessagingResult<()> {
        debug!("🗑️ Deleting message {} from queue: {}", message_id, queue_name);

        self.pgmq
            .delete(queue_name, message_id)
            .await
            .map_err(|e| MessagingError::from(e).in_queue(queue_name, "delete"))?;

        Ok(())
    }

    /// Delete every not-yet-consumed job for a task. Returns how many were removed.
    ///
    /// Jobs already picked up by the worker (`read_ct > 0`) have fired and are
    /// left alone.
    #[instrument(skip(self), fields(queue = %queue_name, task_id = %task_id))]
    pub async fn delete_pending_for_task(
        &self,
        queue_name: &str,
        task_id: &str,
    ) -> MessagingResult<u64> {
        validate_queue_name(queue_name)?;
        let sql = format!(
            "DELETE FROM pgmq.q_{queue_name} WHERE message->>'task_id' = $1 AND read_ct = 0"
        );

        let result = sqlx::query(&sql)
            .bind(task_id)
            .execute(self.pool())
            .await
            .map_err(|e| MessagingError::from(e).in_queue(queue_name, "delete_pending_for_task"))?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!("🗑️ Removed {} pending job(s) for task {}", removed, task_id);
        }
        Ok(removed)
    }

    /// Number of jobs that have not been consumed yet
    #[instrument(skip(self), fields(queue = %queue_name))]
    pub async fn pending_count(&self, queue_name: &str) -> MessagingResult<i64> {
        validate_queue_name(queue_name)?;
        let sql = format!("SELECT COUNT(*) FROM pgmq.q_{queue_name} WHERE read_ct = 0");

        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(self.pool())
            .await
            .map_err(|e| MessagingError::from(e).in_queue(queue_name, "pending_count"))?;
        Ok(count)
    }

    /// Health check - verify database connectivity
    pub async fn health_check(&self) -> bool {
        match sqlx::query("SELECT 1").execute(self.pool()).await {
            Ok(_) => true,
            Err(e) => {
                warn!("pgmq health check failed: {}", e);
                false
            }
        }
    }

    /// Close the underlying connection pool
    pub async fn close(&self) {
        self.pool().close().await;
        info!("🔌 pgmq connection pool closed");
    }

    /// Get reference to underlying connection pool for advanced operations
    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pgmq.connection
    }
}
