//! Notification task queue.
//!
//! Workers wake on Postgres NOTIFY when a pool is given and poll otherwise.
//! A failed attempt is parked with exponential backoff by moving its
//! `scheduled_at`; unrecoverable failures and exhausted retries end the task.
//! [`TaskQueue::shutdown`] stops claiming new work without waiting for tasks
//! already running.

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Notify, Semaphore};
use uuid::Uuid;

use lostfound_core::models::{Priority, Task, TaskStatus, TaskType};
use lostfound_core::{Config, TaskError};
use lostfound_db::{NewTask, TaskRepository, TASK_NOTIFY_CHANNEL};

use crate::context::TaskHandlerContext;

/// Upper bound on the delay before a failed task is retried.
pub const MAX_RETRY_BACKOFF_SECS: u64 = 300;

const LISTENER_RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub(crate) fn retry_backoff_seconds(retry_count: i32) -> u64 {
    1_u64
        .checked_shl(retry_count.clamp(0, 63) as u32)
        .unwrap_or(u64::MAX)
        .min(MAX_RETRY_BACKOFF_SECS)
}

/// What to do with a task whose handler failed or timed out.
#[derive(Debug, PartialEq)]
pub(crate) enum FailureOutcome {
    Retry { backoff_seconds: u64 },
    Fail { result: serde_json::Value },
}

pub(crate) fn failure_outcome(task: &Task, error: &anyhow::Error) -> FailureOutcome {
    let permanent = matches!(error.downcast_ref::<TaskError>(), Some(e) if !e.is_recoverable());

    if !permanent && task.can_retry() {
        return FailureOutcome::Retry {
            backoff_seconds: retry_backoff_seconds(task.retry_count),
        };
    }

    let reason = if permanent {
        "Failure is not retryable"
    } else {
        "Task failed after maximum retries"
    };
    FailureOutcome::Fail {
        result: json!({
            "error": error.to_string(),
            "retry_count": task.retry_count,
            "unrecoverable": permanent,
            "reason": reason,
        }),
    }
}

#[derive(Debug, Clone)]
pub struct TaskQueueConfig {
    pub max_workers: usize,
    pub poll_interval: Duration,
    pub default_timeout_seconds: i32,
    pub max_retries: i32,
    /// Zero disables the stale task reaper.
    pub reap_interval: Duration,
    /// Added to a task's timeout before the reaper considers it abandoned.
    pub reap_grace_seconds: i64,
}

impl Default for TaskQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 2,
            poll_interval: Duration::from_secs(1),
            default_timeout_seconds: 60,
            max_retries: 5,
            reap_interval: Duration::from_secs(60),
            reap_grace_seconds: 120,
        }
    }
}

impl From<&Config> for TaskQueueConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_workers: config.task_worker_count(),
            poll_interval: Duration::from_millis(config.task_poll_interval_ms()),
            default_timeout_seconds: config.task_timeout_seconds(),
            max_retries: config.task_max_retries(),
            reap_interval: Duration::from_secs(config.task_stale_reap_interval_secs()),
            reap_grace_seconds: config.task_stale_grace_period_secs(),
        }
    }
}

/// Handle for queuing notification tasks. Cloning shares the worker pool.
#[derive(Clone)]
pub struct TaskQueue {
    repository: TaskRepository,
    config: TaskQueueConfig,
    shutdown: Arc<watch::Sender<bool>>,
}

impl TaskQueue {
    /// Starts the worker pool. With `pool` set, workers LISTEN for new tasks
    /// as well as polling.
    pub fn new(
        repository: TaskRepository,
        config: TaskQueueConfig,
        context: Weak<dyn TaskHandlerContext>,
        pool: Option<sqlx::PgPool>,
    ) -> Self {
        let (shutdown, stop) = watch::channel(false);
        let wake = Arc::new(Notify::new());

        if let Some(pool) = pool {
            spawn_listener(pool, wake.clone(), stop.clone());
        }
        if !config.reap_interval.is_zero() {
            spawn_reaper(repository.clone(), &config, stop.clone());
        }

        let workers = WorkerPool {
            repository: repository.clone(),
            context,
            slots: Arc::new(Semaphore::new(config.max_workers.max(1))),
        };
        tokio::spawn(workers.run(config.poll_interval, wake, stop));

        Self {
            repository,
            config,
            shutdown: Arc::new(shutdown),
        }
    }

    #[tracing::instrument(skip(self, payload))]
    pub async fn submit_task(
        &self,
        task_type: TaskType,
        payload: serde_json::Value,
        priority: Priority,
    ) -> Result<Uuid> {
        let task = self
            .repository
            .enqueue(NewTask {
                task_type,
                payload,
                priority: priority.as_i32(),
                run_at: None,
                max_retries: self.config.max_retries,
                timeout_seconds: Some(self.config.default_timeout_seconds),
            })
            .await?;
        Ok(task.id)
    }

    /// Signals the workers to stop claiming tasks. Returns immediately.
    pub async fn shutdown(&self) {
        tracing::info!("Stopping task queue");
        let _ = self.shutdown.send(true);
    }
}

fn spawn_listener(pool: sqlx::PgPool, wake: Arc<Notify>, mut stop: watch::Receiver<bool>) {
    tokio::spawn(async move {
        while !*stop.borrow() {
            let mut listener = match sqlx::postgres::PgListener::connect_with(&pool).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::warn!(error = %e, "Task listener cannot connect, retrying");
                    tokio::time::sleep(LISTENER_RECONNECT_DELAY).await;
                    continue;
                }
            };
            if let Err(e) = listener.listen(TASK_NOTIFY_CHANNEL).await {
                tracing::warn!(error = %e, "LISTEN failed, retrying");
                tokio::time::sleep(LISTENER_RECONNECT_DELAY).await;
                continue;
            }

            loop {
                tokio::select! {
                    received = listener.recv() => match received {
                        Ok(_) => wake.notify_one(),
                        Err(e) => {
                            tracing::warn!(error = %e, "Task listener dropped, reconnecting");
                            break;
                        }
                    },
                    _ = stop.changed() => return,
                }
            }
        }
    });
}

fn spawn_reaper(repository: TaskRepository, config: &TaskQueueConfig, mut stop: watch::Receiver<bool>) {
    let mut ticks = tokio::time::interval(config.reap_interval);
    ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let grace = config.reap_grace_seconds;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if let Err(e) = repository.reap_stale_running_tasks(grace).await {
                        tracing::error!(error = %e, "Stale task reaper failed");
                    }
                }
                _ = stop.changed() => break,
            }
        }
    });
}

struct WorkerPool {
    repository: TaskRepository,
    context: Weak<dyn TaskHandlerContext>,
    slots: Arc<Semaphore>,
}

impl WorkerPool {
    async fn run(self, poll_interval: Duration, wake: Arc<Notify>, mut stop: watch::Receiver<bool>) {
        tracing::info!(
            workers = self.slots.available_permits(),
            poll_interval_ms = poll_interval.as_millis() as u64,
            "Task workers started"
        );

        loop {
            tokio::select! {
                _ = stop.changed() => break,
                _ = wake.notified() => self.claim_one().await,
                _ = tokio::time::sleep(poll_interval) => self.claim_one().await,
            }
        }

        tracing::info!("Task workers stopped");
    }

    async fn claim_one(&self) {
        let Ok(slot) = self.slots.clone().try_acquire_owned() else {
            tracing::trace!("All workers busy");
            return;
        };

        let task = match self.repository.claim_next_task().await {
            Ok(Some(task)) => task,
            Ok(None) => return,
            Err(e) => {
                tracing::error!(error = %e, "Failed to claim task");
                return;
            }
        };

        let repository = self.repository.clone();
        let context = self.context.clone();
        tokio::spawn(async move {
            let _slot = slot;
            if let Err(e) = run_task(task, &repository, context).await {
                tracing::error!(error = %e, "Task bookkeeping failed");
            }
        });
    }
}

#[tracing::instrument(skip_all, fields(task.id = %task.id, task.type = %task.task_type, attempt = task.retry_count + 1))]
async fn run_task(
    task: Task,
    repository: &TaskRepository,
    context: Weak<dyn TaskHandlerContext>,
) -> Result<()> {
    let context = context
        .upgrade()
        .ok_or_else(|| anyhow!("task handlers are gone, leaving task to the reaper"))?;

    let limit = Duration::from_secs(task.timeout_seconds.unwrap_or(60).max(1) as u64);
    let error = match tokio::time::timeout(limit, context.dispatch_task(&task)).await {
        Ok(Ok(output)) => {
            repository.finish(task.id, TaskStatus::Completed, output).await?;
            return Ok(());
        }
        Ok(Err(e)) => e,
        Err(_) => anyhow!("timed out after {}s", limit.as_secs()),
    };

    match failure_outcome(&task, &error) {
        FailureOutcome::Retry { backoff_seconds } => {
            tracing::warn!(error = %error, backoff_seconds, "Task attempt failed");
            repository
                .schedule_retry(task.id, backoff_seconds)
                .await
                .context("Failed to schedule retry")?;
        }
        FailureOutcome::Fail { result } => {
            tracing::error!(error = %error, "Task gave up");
            repository.finish(task.id, TaskStatus::Failed, result).await?;
        }
    }
    Ok(())
}
