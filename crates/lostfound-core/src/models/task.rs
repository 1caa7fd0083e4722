use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use super::event::ItemEvent;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    ClientItemFound,
    StaffPickupRequested,
    StaffDeliveryRequested,
}

impl Display for TaskType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskType::ClientItemFound => write!(f, "client_item_found"),
            TaskType::StaffPickupRequested => write!(f, "staff_pickup_requested"),
            TaskType::StaffDeliveryRequested => write!(f, "staff_delivery_requested"),
        }
    }
}

impl FromStr for TaskType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client_item_found" => Ok(TaskType::ClientItemFound),
            "staff_pickup_requested" => Ok(TaskType::StaffPickupRequested),
            "staff_delivery_requested" => Ok(TaskType::StaffDeliveryRequested),
            _ => Err(anyhow::anyhow!("Invalid task type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Scheduled,
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Scheduled => write!(f, "scheduled"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal = 5,
    High = 7,
}

impl Priority {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub priority: i32,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub timeout_seconds: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for Task {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Task {
            id: row.try_get("id")?,
            task_type: row.try_get::<String, _>("task_type")?.parse().map_err(|e| {
                sqlx::Error::Decode(format!("Failed to parse task_type: {}", e).into())
            })?,
            status: row.try_get("status")?,
            priority: row.try_get("priority")?,
            payload: row.try_get("payload")?,
            result: row.try_get("result")?,
            scheduled_at: row.try_get("scheduled_at")?,
            started_at: row.try_get("started_at")?,
            completed_at: row.try_get("completed_at")?,
            retry_count: row.try_get("retry_count")?,
            max_retries: row.try_get("max_retries")?,
            timeout_seconds: row.try_get("timeout_seconds")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Task {
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Extract the payload as a typed struct, returning an error on failure.
    pub fn try_payload_as<P: TaskPayload>(&self) -> Result<P, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Trait for type-safe task payloads
pub trait TaskPayload: Serialize + for<'de> Deserialize<'de> {
    fn task_type() -> TaskType;
}

/// Tell a guest their item was found
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientItemFoundPayload {
    pub item_id: String,
    pub title: String,
    pub client_id: String,
}

impl TaskPayload for ClientItemFoundPayload {
    fn task_type() -> TaskType {
        TaskType::ClientItemFound
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaffPickupRequestedPayload {
    pub item_id: String,
    pub title: String,
    pub client_email: Option<String>,
}

impl TaskPayload for StaffPickupRequestedPayload {
    fn task_type() -> TaskType {
        TaskType::StaffPickupRequested
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaffDeliveryRequestedPayload {
    pub item_id: String,
    pub title: String,
    pub city: String,
    pub client_email: Option<String>,
}

impl TaskPayload for StaffDeliveryRequestedPayload {
    fn task_type() -> TaskType {
        TaskType::StaffDeliveryRequested
    }
}

/// Maps a domain event to the task that delivers its notification.
pub fn task_for_event(event: &ItemEvent) -> Result<(TaskType, serde_json::Value), serde_json::Error> {
    match event {
        ItemEvent::ItemFound {
            item_id,
            title,
            client_id,
        } => Ok((
            ClientItemFoundPayload::task_type(),
            serde_json::to_value(ClientItemFoundPayload {
                item_id: item_id.clone(),
                title: title.clone(),
                client_id: client_id.clone(),
            })?,
        )),
        ItemEvent::PickupRequested {
            item_id,
            title,
            client_email,
        } => Ok((
            StaffPickupRequestedPayload::task_type(),
            serde_json::to_value(StaffPickupRequestedPayload {
                item_id: item_id.clone(),
                title: title.clone(),
                client_email: client_email.clone(),
            })?,
        )),
        ItemEvent::DeliveryRequested {
            item_id,
            title,
            city,
            client_email,
        } => Ok((
            StaffDeliveryRequestedPayload::task_type(),
            serde_json::to_value(StaffDeliveryRequestedPayload {
                item_id: item_id.clone(),
                title: title.clone(),
                city: city.clone(),
                client_email: client_email.clone(),
            })?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(task_type: TaskType, payload: serde_json::Value) -> Task {
        Task {
            id: Uuid::new_v4(),
            task_type,
            status: TaskStatus::Pending,
            priority: Priority::Normal.as_i32(),
            payload,
            result: None,
            scheduled_at: Utc::now(),
            started_at: None,
            completed_at: None,
            retry_count: 0,
            max_retries: 3,
            timeout_seconds: Some(60),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_task_type_round_trip() {
        for task_type in [
            TaskType::ClientItemFound,
            TaskType::StaffPickupRequested,
            TaskType::StaffDeliveryRequested,
        ] {
            assert_eq!(task_type.to_string().parse::<TaskType>().unwrap(), task_type);
        }
        assert!("video_transcode".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_item_found_event_becomes_client_task() {
        let event = ItemEvent::ItemFound {
            item_id: "ITEM-X".to_string(),
            title: "Wallet".to_string(),
            client_id: "c1".to_string(),
        };
        let (task_type, payload) = task_for_event(&event).unwrap();
        assert_eq!(task_type, TaskType::ClientItemFound);

        let task = task(task_type, payload);
        let payload: ClientItemFoundPayload = task.try_payload_as().unwrap();
        assert_eq!(payload.client_id, "c1");
        assert_eq!(payload.item_id, "ITEM-X");
    }

    #[test]
    fn test_delivery_event_becomes_staff_task() {
        let event = ItemEvent::DeliveryRequested {
            item_id: "ITEM-7".to_string(),
            title: "Scarf".to_string(),
            city: "Brussels".to_string(),
            client_email: Some("guest@example.com".to_string()),
        };
        let (task_type, payload) = task_for_event(&event).unwrap();
        assert_eq!(task_type, TaskType::StaffDeliveryRequested);
        assert_eq!(payload["city"], "Brussels");
    }

    #[test]
    fn test_task_retry_budget() {
        let mut t = task(TaskType::ClientItemFound, serde_json::json!({}));
        assert!(t.can_retry());
        t.retry_count = 3;
        assert!(!t.can_retry());
    }

    #[test]
    fn test_wrong_payload_shape_is_an_error() {
        let t = task(TaskType::ClientItemFound, serde_json::json!({"item_id": 5}));
        assert!(t.try_payload_as::<ClientItemFoundPayload>().is_err());
    }
}
