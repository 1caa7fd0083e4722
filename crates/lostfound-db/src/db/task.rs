//! Durable notification tasks.
//!
//! Rows move `pending`/`scheduled` -> `running` -> `completed` | `failed`,
//! with failed attempts going back to `scheduled` until retries run out.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use lostfound_core::models::{Task, TaskStatus, TaskType};

/// Channel workers LISTEN on for newly created tasks.
pub const TASK_NOTIFY_CHANNEL: &str = "lostfound_new_task";

const COLUMNS: &str = "id, task_type, status, priority, payload, result, \
     scheduled_at, started_at, completed_at, retry_count, max_retries, timeout_seconds, \
     created_at, updated_at";

/// A task about to be queued.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub task_type: TaskType,
    pub payload: serde_json::Value,
    pub priority: i32,
    /// Runs as soon as a worker is free when unset.
    pub run_at: Option<DateTime<Utc>>,
    pub max_retries: i32,
    pub timeout_seconds: Option<i32>,
}

impl NewTask {
    fn initial_status(&self, now: DateTime<Utc>) -> (TaskStatus, DateTime<Utc>) {
        match self.run_at {
            Some(at) if at > now => (TaskStatus::Scheduled, at),
            _ => (TaskStatus::Pending, now),
        }
    }
}

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the task and NOTIFYs workers in one transaction, so a worker
    /// woken by the notification always finds the row.
    #[tracing::instrument(skip(self, task), fields(task.type = %task.task_type))]
    pub async fn enqueue(&self, task: NewTask) -> Result<Task> {
        let (status, scheduled_at) = task.initial_status(Utc::now());
        let mut tx = self.pool.begin().await.context("Failed to open task transaction")?;

        let sql = format!(
            "INSERT INTO tasks (task_type, status, priority, payload, scheduled_at, max_retries, timeout_seconds) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            COLUMNS
        );
        let created = sqlx::query_as::<Postgres, Task>(&sql)
            .bind(task.task_type.to_string())
            .bind(status)
            .bind(task.priority)
            .bind(&task.payload)
            .bind(scheduled_at)
            .bind(task.max_retries)
            .bind(task.timeout_seconds)
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert {} task", task.task_type))?;

        // A failed NOTIFY aborts the transaction, so it must fail the enqueue too.
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(TASK_NOTIFY_CHANNEL)
            .bind(created.id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to notify task workers")?;

        tx.commit().await.context("Failed to commit task")?;
        tracing::debug!(task.id = %created.id, status = %created.status, "Task queued");
        Ok(created)
    }

    /// Takes the highest-priority runnable task, skipping rows other workers
    /// hold, and marks it running.
    pub async fn claim_next_task(&self) -> Result<Option<Task>> {
        let sql = format!(
            "UPDATE tasks SET status = 'running', started_at = NOW(), updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM tasks \
                 WHERE status IN ('pending', 'scheduled') AND scheduled_at <= NOW() \
                 ORDER BY priority DESC, scheduled_at \
                 LIMIT 1 FOR UPDATE SKIP LOCKED \
             ) RETURNING {}",
            COLUMNS
        );
        sqlx::query_as::<Postgres, Task>(&sql)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to claim next task")
    }

    /// Moves a running task to `completed` or `failed`, keeping `result`.
    #[tracing::instrument(skip(self, result))]
    pub async fn finish(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        result: serde_json::Value,
    ) -> Result<Task> {
        debug_assert!(matches!(status, TaskStatus::Completed | TaskStatus::Failed));
        let sql = format!(
            "UPDATE tasks SET status = $2, result = $3, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        let task = sqlx::query_as::<Postgres, Task>(&sql)
            .bind(task_id)
            .bind(status)
            .bind(result)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to mark task {}", status))?;

        if status == TaskStatus::Failed {
            tracing::warn!(task.type = %task.task_type, retry_count = task.retry_count, "Task failed");
        } else {
            tracing::info!(task.type = %task.task_type, "Task completed");
        }
        Ok(task)
    }

    /// Counts the attempt and parks the task until `delay_seconds` from now.
    #[tracing::instrument(skip(self))]
    pub async fn schedule_retry(&self, task_id: Uuid, delay_seconds: u64) -> Result<Task> {
        let sql = format!(
            "UPDATE tasks SET status = 'scheduled', retry_count = retry_count + 1, started_at = NULL, \
                 scheduled_at = NOW() + make_interval(secs => $2), updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        let task = sqlx::query_as::<Postgres, Task>(&sql)
            .bind(task_id)
            .bind(delay_seconds as f64)
            .fetch_one(&self.pool)
            .await
            .context("Failed to schedule task retry")?;

        tracing::info!(
            retry_count = task.retry_count,
            max_retries = task.max_retries,
            scheduled_at = %task.scheduled_at,
            "Task retry scheduled"
        );
        Ok(task)
    }

    /// Recovers tasks left `running` by a worker that died: they go back to
    /// `pending`, or to `failed` once out of retries. Returns how many moved.
    pub async fn reap_stale_running_tasks(&self, grace_seconds: i64) -> Result<u64> {
        let moved = sqlx::query(
            r#"
            UPDATE tasks
            SET status = CASE WHEN retry_count < max_retries
                              THEN 'pending'::task_status ELSE 'failed'::task_status END,
                retry_count = LEAST(retry_count + 1, max_retries),
                result = CASE WHEN retry_count < max_retries
                              THEN result
                              ELSE jsonb_build_object('error', 'Task abandoned while running') END,
                completed_at = CASE WHEN retry_count < max_retries THEN NULL ELSE NOW() END,
                started_at = NULL,
                updated_at = NOW()
            WHERE status = 'running'
              AND started_at < NOW() - make_interval(secs => COALESCE(timeout_seconds, 0) + $1)
            "#,
        )
        .bind(grace_seconds as f64)
        .execute(&self.pool)
        .await
        .context("Failed to reap stale tasks")?
        .rows_affected();

        if moved > 0 {
            tracing::warn!(moved, "Reaped stale running tasks");
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_task(run_at: Option<DateTime<Utc>>) -> NewTask {
        NewTask {
            task_type: TaskType::ClientItemFound,
            payload: serde_json::json!({}),
            priority: 7,
            run_at,
            max_retries: 5,
            timeout_seconds: Some(60),
        }
    }

    #[test]
    fn immediate_task_is_pending() {
        let now = Utc::now();
        assert_eq!(new_task(None).initial_status(now), (TaskStatus::Pending, now));
        let past = now - Duration::seconds(5);
        assert_eq!(new_task(Some(past)).initial_status(now), (TaskStatus::Pending, now));
    }

    #[test]
    fn future_task_is_scheduled() {
        let now = Utc::now();
        let later = now + Duration::minutes(10);
        assert_eq!(
            new_task(Some(later)).initial_status(now),
            (TaskStatus::Scheduled, later)
        );
    }
}
