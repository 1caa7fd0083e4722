use super::TaskHandler;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use lostfound_core::models::{
    ClientItemFoundPayload, StaffDeliveryRequestedPayload, StaffPickupRequestedPayload, Task,
    TaskType,
};
use lostfound_core::{TaskError, TaskResultExt};
use lostfound_db::ClientDirectory;

use crate::services::notifications::{
    item_found_mail, staff_delivery_mail, staff_pickup_mail, OutgoingMail,
};
use crate::services::Mailer;

/// Sends the mails behind lifecycle events: the guest when their item is
/// found, the front desk when a guest picks pickup or delivery.
pub struct NotificationTaskHandler {
    directory: Arc<dyn ClientDirectory>,
    mailer: Option<Arc<dyn Mailer>>,
    frontend_url: String,
    staff_email: Option<String>,
}

impl NotificationTaskHandler {
    pub fn new(
        directory: Arc<dyn ClientDirectory>,
        mailer: Option<Arc<dyn Mailer>>,
        frontend_url: impl Into<String>,
        staff_email: Option<String>,
    ) -> Self {
        Self {
            directory,
            mailer,
            frontend_url: frontend_url.into(),
            staff_email,
        }
    }

    fn staff_email(&self) -> Result<&str, TaskError> {
        self.staff_email
            .as_deref()
            .ok_or_else(|| TaskError::unrecoverable(anyhow!("STAFF_NOTIFICATION_EMAIL is not set")))
    }

    async fn client_item_found(&self, task: &Task) -> Result<OutgoingMail, TaskError> {
        let payload: ClientItemFoundPayload = task.try_payload_as().unrecoverable()?;

        let contact = self
            .directory
            .resolve_client_contact(&payload.client_id)
            .await
            .map_err(|e| TaskError::recoverable(anyhow!("client lookup failed: {}", e)))?
            .ok_or_else(|| {
                TaskError::unrecoverable(anyhow!(
                    "client {} has no contact record",
                    payload.client_id
                ))
            })?;

        Ok(item_found_mail(&contact, &payload, &self.frontend_url))
    }

    fn staff_pickup(&self, task: &Task) -> Result<OutgoingMail, TaskError> {
        let payload: StaffPickupRequestedPayload = task.try_payload_as().unrecoverable()?;
        Ok(staff_pickup_mail(self.staff_email()?, &payload))
    }

    fn staff_delivery(&self, task: &Task) -> Result<OutgoingMail, TaskError> {
        let payload: StaffDeliveryRequestedPayload = task.try_payload_as().unrecoverable()?;
        Ok(staff_delivery_mail(self.staff_email()?, &payload))
    }

    async fn compose(&self, task: &Task) -> Result<OutgoingMail, TaskError> {
        match task.task_type {
            TaskType::ClientItemFound => self.client_item_found(task).await,
            TaskType::StaffPickupRequested => self.staff_pickup(task),
            TaskType::StaffDeliveryRequested => self.staff_delivery(task),
        }
    }
}

#[async_trait]
impl TaskHandler for NotificationTaskHandler {
    #[tracing::instrument(skip(self, task), fields(task.id = %task.id, task.type = %task.task_type))]
    async fn process(&self, task: &Task) -> Result<serde_json::Value> {
        let mailer = self
            .mailer
            .as_ref()
            .ok_or_else(|| TaskError::unrecoverable(anyhow!("SMTP is not configured")))?;

        let mail = self.compose(task).await?;

        mailer
            .send_mail(&mail.to, &mail.subject, &mail.body)
            .await
            .map_err(|e| TaskError::recoverable(anyhow!("sending mail failed: {}", e)))?;

        tracing::info!(to = %mail.to, subject = %mail.subject, "Notification sent");

        Ok(json!({
            "sent_to": mail.to,
            "subject": mail.subject,
        }))
    }
}
