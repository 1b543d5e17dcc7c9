//! # Task Store
//!
//! Persistence for tasks created from chat messages. The PostgreSQL store is
//! used in deployments; the in-memory store backs tests and runs without a
//! database.

use crate::error::{ReminderError, Result};
use crate::models::{Task, TaskPriority, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sqlx::{FromRow, PgPool};
use std::cmp::Ordering;
use std::str::FromStr;
use tracing::{debug, instrument};

#[async_trait]
pub trait TaskStore: Send + Sync + std::fmt::Debug {
    /// Insert the task, or overwrite the stored copy with the same id
    async fn save(&self, task: &Task) -> Result<()>;

    async fn find(&self, task_id: &str) -> Result<Option<Task>>;

    /// A user's tasks, earliest due first; tasks without a due time last
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Task>>;

    /// `false` when no task has the id
    async fn update_status(&self, task_id: &str, status: TaskStatus) -> Result<bool>;
}

/// Database row for `reminder_tasks`
#[derive(Debug, FromRow)]
struct TaskRow {
    task_id: String,
    user_id: String,
    title: String,
    due_at: Option<DateTime<Utc>>,
    priority: String,
    status: String,
    channel: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = ReminderError;

    fn try_from(row: TaskRow) -> Result<Self> {
        Ok(Task {
            priority: TaskPriority::from_str(&row.priority).map_err(ReminderError::Database)?,
            status: TaskStatus::from_str(&row.status).map_err(ReminderError::Database)?,
            task_id: row.task_id,
            user_id: row.user_id,
            title: row.title,
            due_at: row.due_at,
            channel: row.channel,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const TASK_COLUMNS: &str =
    "task_id, user_id, title, due_at, priority, status, channel, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    #[instrument(skip(self, task), fields(task_id = %task.task_id))]
    async fn save(&self, task: &Task) -> Result<()> {
        task.validate().map_err(ReminderError::Validation)?;

        sqlx::query(
            r#"
            INSERT INTO reminder_tasks
                (task_id, user_id, title, due_at, priority, status, channel, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (task_id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                title = EXCLUDED.title,
                due_at = EXCLUDED.due_at,
                priority = EXCLUDED.priority,
                status = EXCLUDED.status,
                channel = EXCLUDED.channel,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&task.task_id)
        .bind(&task.user_id)
        .bind(&task.title)
        .bind(task.due_at)
        .bind(task.priority.as_str())
        .bind(task.status.as_str())
        .bind(&task.channel)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        debug!("💾 Task saved");
        Ok(())
    }

    async fn find(&self, task_id: &str) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM reminder_tasks WHERE task_id = $1");
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Task::try_from).transpose()
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM reminder_tasks WHERE user_id = $1 \
             ORDER BY due_at ASC NULLS LAST, created_at ASC"
        );
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Task::try_from).collect()
    }

    async fn update_status(&self, task_id: &str, status: TaskStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE reminder_tasks SET status = $2, updated_at = NOW() WHERE task_id = $1",
        )
        .bind(task_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: DashMap<String, Task>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

fn due_order(a: &Task, b: &Task) -> Ordering {
    match (a.due_at, b.due_at) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.created_at.cmp(&b.created_at))
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn save(&self, task: &Task) -> Result<()> {
        task.validate().map_err(ReminderError::Validation)?;
        self.tasks.insert(task.task_id.clone(), task.clone());
        Ok(())
    }

    async fn find(&self, task_id: &str) -> Result<Option<Task>> {
        Ok(self.tasks.get(task_id).map(|entry| entry.value().clone()))
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        tasks.sort_by(due_order);
        Ok(tasks)
    }

    async fn update_status(&self, task_id: &str, status: TaskStatus) -> Result<bool> {
        match self.tasks.get_mut(task_id) {
            Some(mut task) => {
                task.status = status;
                task.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
