//! The API implements [`TaskHandlerContext`] for its task dispatcher. The
//! worker holds it weakly so a shut-down API never keeps the pool alive.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use lostfound_core::models::Task;

#[async_trait]
pub trait TaskHandlerContext: Send + Sync {
    /// Run the handler registered for `task.task_type`.
    async fn dispatch_task(self: Arc<Self>, task: &Task) -> Result<serde_json::Value>;
}
