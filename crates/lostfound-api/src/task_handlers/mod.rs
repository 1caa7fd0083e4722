mod notification;

use anyhow::Result;
use async_trait::async_trait;
use lostfound_core::models::Task;

pub use notification::NotificationTaskHandler;

#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Runs one task. Errors wrapping a non-recoverable
    /// [`TaskError`](lostfound_core::TaskError) fail the task without retries.
    async fn process(&self, task: &Task) -> Result<serde_json::Value>;
}
