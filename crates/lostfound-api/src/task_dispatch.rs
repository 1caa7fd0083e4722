//! Routes claimed tasks to their handlers.
//!
//! The worker pool only knows [`TaskHandlerContext`]; this is the API's
//! implementation of it.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use lostfound_core::models::{Task, TaskType};
use lostfound_worker::TaskHandlerContext;

use crate::task_handlers::{NotificationTaskHandler, TaskHandler};

pub struct TaskDispatcher {
    notifications: NotificationTaskHandler,
}

impl TaskDispatcher {
    pub fn new(notifications: NotificationTaskHandler) -> Self {
        Self { notifications }
    }

    fn handler_for(&self, task_type: TaskType) -> &dyn TaskHandler {
        match task_type {
            TaskType::ClientItemFound
            | TaskType::StaffPickupRequested
            | TaskType::StaffDeliveryRequested => &self.notifications,
        }
    }
}

#[async_trait]
impl TaskHandlerContext for TaskDispatcher {
    async fn dispatch_task(self: Arc<Self>, task: &Task) -> Result<serde_json::Value> {
        tracing::debug!(task_id = %task.id, task_type = %task.task_type, "Dispatching task");
        self.handler_for(task.task_type).process(task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Mailer;
    use crate::test_helpers::{task_for, InMemoryClientDirectory, RecordingMailer};
    use lostfound_core::models::ItemEvent;

    #[tokio::test]
    async fn test_pickup_task_reaches_the_notification_handler() {
        let mailer = Arc::new(RecordingMailer::default());
        let dispatcher = Arc::new(TaskDispatcher::new(NotificationTaskHandler::new(
            Arc::new(InMemoryClientDirectory::default()),
            Some(mailer.clone() as Arc<dyn Mailer>),
            "http://localhost:5173",
            Some("desk@hotel.example".to_string()),
        )));

        let task = task_for(&ItemEvent::PickupRequested {
            item_id: "ITEM-1".to_string(),
            title: "Keys".to_string(),
            client_email: None,
        });
        let result = dispatcher.dispatch_task(&task).await.unwrap();

        assert_eq!(result["sent_to"], "desk@hotel.example");
        assert_eq!(mailer.sent()[0].subject, "Pickup requested: Keys (ITEM-1)");
    }
}
