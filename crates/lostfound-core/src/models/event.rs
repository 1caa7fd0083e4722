use serde::{Deserialize, Serialize};

/// Domain events raised after a lifecycle write has committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ItemEvent {
    /// Staff marked a guest's report as found; the guest is told to choose pickup or delivery.
    ItemFound {
        item_id: String,
        title: String,
        client_id: String,
    },
    PickupRequested {
        item_id: String,
        title: String,
        client_email: Option<String>,
    },
    DeliveryRequested {
        item_id: String,
        title: String,
        city: String,
        client_email: Option<String>,
    },
}

impl ItemEvent {
    pub fn item_id(&self) -> &str {
        match self {
            ItemEvent::ItemFound { item_id, .. }
            | ItemEvent::PickupRequested { item_id, .. }
            | ItemEvent::DeliveryRequested { item_id, .. } => item_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ItemEvent::ItemFound { .. } => "item_found",
            ItemEvent::PickupRequested { .. } => "pickup_requested",
            ItemEvent::DeliveryRequested { .. } => "delivery_requested",
        }
    }
}
