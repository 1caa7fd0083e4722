//! Lost-item lifecycle service.
//!
//! Every operation takes the caller's session explicitly. Writes go to the
//! [`ItemStore`] first; events are published only after the write returned,
//! and a failed publication is logged without failing the operation.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use lostfound_core::lifecycle::{
    creation_status, dashboard_stats, ensure_staff, ensure_status, generate_public_id,
    status_change_event,
};
use lostfound_core::models::{
    CreateItemRequest, DashboardStats, DeliveryAddress, DeliveryDetails, DeliveryTicket,
    ItemChanges, ItemEvent, ItemStatus, ListItemsQuery, LostItem, NewLostItem, Role,
    SessionContext, UpdateItemRequest,
};
use lostfound_core::validation::{validate_image, validate_public_id};
use lostfound_core::{AppError, Config, ItemScope};
use lostfound_db::ItemStore;

use super::events::EventPublisher;

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub max_image_bytes: usize,
    pub delivery_fee_cents: i64,
    pub currency: String,
}

impl From<&Config> for LifecycleSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_image_bytes: config.max_image_size_bytes(),
            delivery_fee_cents: config.delivery_fee_cents(),
            currency: config.payment_currency().to_string(),
        }
    }
}

#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn ItemStore>,
    publisher: Arc<dyn EventPublisher>,
    settings: LifecycleSettings,
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Item {} not found", id))
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Empty strings mean "no image".
fn normalize_image(image: Option<String>, max_bytes: usize) -> Result<Option<String>, AppError> {
    match image.map(|i| i.trim().to_string()).filter(|i| !i.is_empty()) {
        Some(image) => {
            validate_image(&image, max_bytes)?;
            Ok(Some(image))
        }
        None => Ok(None),
    }
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn ItemStore>,
        publisher: Arc<dyn EventPublisher>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            store,
            publisher,
            settings,
        }
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    async fn publish(&self, event: ItemEvent) {
        let name = event.name();
        let item_id = event.item_id().to_string();
        if let Err(e) = self.publisher.publish(event).await {
            tracing::error!(
                error = %e,
                event = name,
                item.id = %item_id,
                "Failed to publish lifecycle event; the write stands"
            );
        }
    }

    /// Files a new report.
    #[tracing::instrument(skip(self, session, request), fields(role = %session.role))]
    pub async fn create_item(
        &self,
        session: &SessionContext,
        request: CreateItemRequest,
    ) -> Result<LostItem, AppError> {
        let mut missing = Vec::new();
        if blank(&request.title) {
            missing.push("title".to_string());
        }
        if blank(&request.place_last_seen) {
            missing.push("place_last_seen".to_string());
        }
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }

        let status = creation_status(session.role, request.status.as_deref())?;

        let id = match request.id.map(|id| id.trim().to_string()) {
            Some(id) if !id.is_empty() => {
                validate_public_id(&id)?;
                id
            }
            _ => generate_public_id(),
        };

        let image = normalize_image(request.image, self.settings.max_image_bytes)?;

        let (client_id, client_email, email) = match session.role {
            Role::Client => {
                let client_id = session.client_id.clone().ok_or_else(|| {
                    AppError::Unauthorized("Client session has no client id".to_string())
                })?;
                let email = request.email.or_else(|| Some(session.email.clone()));
                (Some(client_id), Some(session.email.clone()), email)
            }
            Role::Staff => (None, None, request.email),
        };

        let new_item = NewLostItem {
            id,
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            place_last_seen: request.place_last_seen.trim().to_string(),
            date_last_seen: request.date_last_seen,
            image,
            status,
            expiration: request.expiration.unwrap_or_default(),
            email,
            client_email,
            client_id,
        };

        let item = self.store.insert(new_item).await?;
        tracing::info!(item.id = %item.id, status = %item.status, "Item reported");
        Ok(item)
    }

    /// Staff overwrite of the status with any valid label.
    #[tracing::instrument(skip(self, session), fields(role = %session.role))]
    pub async fn set_status(
        &self,
        session: &SessionContext,
        id: &str,
        raw_status: &str,
    ) -> Result<LostItem, AppError> {
        ensure_staff(session, "change an item's status")?;
        let status: ItemStatus = raw_status.trim().parse()?;

        let item = self
            .store
            .update_fields(id, ItemChanges::status(status))
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(item.id = %item.id, status = %status, "Item status set");

        if let Some(event) = status_change_event(&item, status) {
            self.publish(event).await;
        }
        Ok(item)
    }

    /// Staff edit of the descriptive fields, optionally with a status change.
    #[tracing::instrument(skip(self, session, request), fields(role = %session.role))]
    pub async fn update_item(
        &self,
        session: &SessionContext,
        id: &str,
        request: UpdateItemRequest,
    ) -> Result<LostItem, AppError> {
        ensure_staff(session, "edit items")?;

        let status = match request.status.as_deref() {
            Some(raw) => Some(raw.trim().parse::<ItemStatus>()?),
            None => None,
        };

        let mut missing = Vec::new();
        if request.title.as_deref().is_some_and(blank) {
            missing.push("title".to_string());
        }
        if request.place_last_seen.as_deref().is_some_and(blank) {
            missing.push("place_last_seen".to_string());
        }
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }

        let image = match request.image {
            Some(image) => Some(normalize_image(image, self.settings.max_image_bytes)?),
            None => None,
        };

        let changes = ItemChanges {
            title: request.title.map(|t| t.trim().to_string()),
            description: request.description.map(|d| d.trim().to_string()),
            place_last_seen: request.place_last_seen.map(|p| p.trim().to_string()),
            date_last_seen: request.date_last_seen,
            image,
            expiration: request.expiration,
            status,
            ..Default::default()
        };

        if changes.is_empty() {
            return self
                .store
                .find_by_public_id(id)
                .await?
                .ok_or_else(|| not_found(id));
        }

        let item = self
            .store
            .update_fields(id, changes)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(item.id = %item.id, status = %item.status, "Item edited");

        if let Some(status) = status {
            if let Some(event) = status_change_event(&item, status) {
                self.publish(event).await;
            }
        }
        Ok(item)
    }

    #[tracing::instrument(skip(self, session), fields(role = %session.role))]
    pub async fn delete_item(&self, session: &SessionContext, id: &str) -> Result<(), AppError> {
        ensure_staff(session, "delete items")?;
        if self.store.delete_by_public_id(id).await? {
            tracing::info!(item.id = %id, "Item deleted");
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    /// Items the caller may not see are reported as missing.
    #[tracing::instrument(skip(self, session), fields(role = %session.role))]
    pub async fn get_item(&self, session: &SessionContext, id: &str) -> Result<LostItem, AppError> {
        match self.store.find_by_public_id(id).await? {
            Some(item) if session.can_access(&item) => Ok(item),
            _ => Err(not_found(id)),
        }
    }

    #[tracing::instrument(skip(self, session), fields(role = %session.role))]
    pub async fn request_pickup(
        &self,
        session: &SessionContext,
        id: &str,
    ) -> Result<LostItem, AppError> {
        let item = self.get_item(session, id).await?;
        ensure_status(&item, ItemStatus::FoundByStaff)?;

        let changes = ItemChanges {
            status: Some(ItemStatus::PickupRequested),
            pickup_requested_at: Some(Utc::now()),
            ..Default::default()
        };
        let item = self
            .store
            .update_fields(id, changes)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(item.id = %item.id, "Pickup requested");

        self.publish(ItemEvent::PickupRequested {
            item_id: item.id.clone(),
            title: item.title.clone(),
            client_email: item.client_email.clone(),
        })
        .await;
        Ok(item)
    }

    /// Records a delivery address and returns the reference to pay against.
    #[tracing::instrument(skip(self, session, address), fields(role = %session.role))]
    pub async fn request_delivery(
        &self,
        session: &SessionContext,
        id: &str,
        address: DeliveryAddress,
    ) -> Result<(LostItem, DeliveryTicket), AppError> {
        let missing = address.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }

        let item = self.get_item(session, id).await?;
        ensure_status(&item, ItemStatus::FoundByStaff)?;

        let reference = Uuid::new_v4();
        let changes = ItemChanges {
            status: Some(ItemStatus::DeliveryRequested),
            delivery: Some(DeliveryDetails {
                address: address.address.trim().to_string(),
                city: address.city.trim().to_string(),
                postal_code: address.postal_code.trim().to_string(),
                phone: address.phone.trim().to_string(),
                reference,
                requested_at: Utc::now(),
            }),
            ..Default::default()
        };
        let item = self
            .store
            .update_fields(id, changes)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(item.id = %item.id, delivery.reference = %reference, "Delivery requested");

        self.publish(ItemEvent::DeliveryRequested {
            item_id: item.id.clone(),
            title: item.title.clone(),
            city: item.delivery_city.clone().unwrap_or_default(),
            client_email: item.client_email.clone(),
        })
        .await;

        let ticket = DeliveryTicket {
            item_id: item.id.clone(),
            delivery_reference: reference,
            amount_cents: self.settings.delivery_fee_cents,
            currency: self.settings.currency.clone(),
        };
        Ok((item, ticket))
    }

    #[tracing::instrument(skip(self, session, query), fields(role = %session.role))]
    pub async fn list_visible(
        &self,
        session: &SessionContext,
        query: &ListItemsQuery,
    ) -> Result<Vec<LostItem>, AppError> {
        let scope = ItemScope::for_session(session, query.section, query.q.as_deref(), query.date);
        self.store.list(&scope).await
    }

    #[tracing::instrument(skip(self, session), fields(role = %session.role))]
    pub async fn dashboard_stats(
        &self,
        session: &SessionContext,
    ) -> Result<DashboardStats, AppError> {
        ensure_staff(session, "view statistics")?;
        let items = self
            .store
            .list(&ItemScope::for_session(session, None, None, None))
            .await?;
        Ok(dashboard_stats(&items))
    }

    /// The item a delivery payment is for. It must be visible to the caller
    /// and still waiting on its delivery.
    #[tracing::instrument(skip(self, session), fields(role = %session.role))]
    pub async fn payable_delivery(
        &self,
        session: &SessionContext,
        reference: Uuid,
    ) -> Result<LostItem, AppError> {
        let item = match self.store.find_by_delivery_reference(reference).await? {
            Some(item) if session.can_access(&item) => item,
            _ => {
                return Err(AppError::NotFound(format!(
                    "No delivery with reference {}",
                    reference
                )))
            }
        };
        ensure_status(&item, ItemStatus::DeliveryRequested)?;
        Ok(item)
    }
}
