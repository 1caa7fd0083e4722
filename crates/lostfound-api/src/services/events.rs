//! Publication of lifecycle events.

use async_trait::async_trait;
use lostfound_core::models::{task_for_event, ItemEvent, Priority};
use lostfound_core::AppError;
use lostfound_worker::TaskQueue;

/// Receives events after the write that raised them has committed.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: ItemEvent) -> Result<(), AppError>;
}

/// Turns each event into a notification task on the background queue.
#[derive(Clone)]
pub struct TaskQueueEventPublisher {
    queue: TaskQueue,
}

impl TaskQueueEventPublisher {
    pub fn new(queue: TaskQueue) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl EventPublisher for TaskQueueEventPublisher {
    #[tracing::instrument(skip(self, event), fields(event = event.name(), item.id = %event.item_id()))]
    async fn publish(&self, event: ItemEvent) -> Result<(), AppError> {
        let (task_type, payload) = task_for_event(&event)?;
        // Guests waiting on their belongings go ahead of staff notices.
        let priority = match event {
            ItemEvent::ItemFound { .. } => Priority::High,
            _ => Priority::Normal,
        };
        let task_id = self.queue.submit_task(task_type, payload, priority).await?;
        tracing::debug!(task_id = %task_id, "Event queued for notification");
        Ok(())
    }
}
