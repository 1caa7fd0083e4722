//! Storage abstractions used by the lifecycle service and notification handlers.
//!
//! The PostgreSQL repositories implement them; tests use in-memory versions.

use async_trait::async_trait;
use lostfound_core::models::{ClientContact, ItemChanges, LostItem, NewLostItem};
use lostfound_core::{AppError, ItemScope};
use uuid::Uuid;

use crate::db::{ClientRepository, LostItemRepository};

/// Persistence for lost items, keyed on the public id.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Fails with `Conflict` when the public id is taken.
    async fn insert(&self, item: NewLostItem) -> Result<LostItem, AppError>;

    /// Lookup by storage identity.
    async fn find_by_id(&self, storage_id: Uuid) -> Result<Option<LostItem>, AppError>;

    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<LostItem>, AppError>;

    async fn find_by_delivery_reference(
        &self,
        reference: Uuid,
    ) -> Result<Option<LostItem>, AppError>;

    async fn list(&self, scope: &ItemScope) -> Result<Vec<LostItem>, AppError>;

    /// Returns `None` when the item does not exist.
    async fn update_fields(
        &self,
        public_id: &str,
        changes: ItemChanges,
    ) -> Result<Option<LostItem>, AppError>;

    /// Returns whether an item was removed.
    async fn delete_by_public_id(&self, public_id: &str) -> Result<bool, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// Resolves where a client's notifications go.
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn resolve_client_contact(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientContact>, AppError>;
}

#[async_trait]
impl ItemStore for LostItemRepository {
    async fn insert(&self, item: NewLostItem) -> Result<LostItem, AppError> {
        LostItemRepository::insert(self, item).await
    }

    async fn find_by_id(&self, storage_id: Uuid) -> Result<Option<LostItem>, AppError> {
        LostItemRepository::find_by_id(self, storage_id).await
    }

    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<LostItem>, AppError> {
        LostItemRepository::find_by_public_id(self, public_id).await
    }

    async fn find_by_delivery_reference(
        &self,
        reference: Uuid,
    ) -> Result<Option<LostItem>, AppError> {
        LostItemRepository::find_by_delivery_reference(self, reference).await
    }

    async fn list(&self, scope: &ItemScope) -> Result<Vec<LostItem>, AppError> {
        LostItemRepository::list(self, scope).await
    }

    async fn update_fields(
        &self,
        public_id: &str,
        changes: ItemChanges,
    ) -> Result<Option<LostItem>, AppError> {
        LostItemRepository::update_fields(self, public_id, changes).await
    }

    async fn delete_by_public_id(&self, public_id: &str) -> Result<bool, AppError> {
        LostItemRepository::delete_by_public_id(self, public_id).await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        LostItemRepository::health_check(self).await
    }
}

#[async_trait]
impl ClientDirectory for ClientRepository {
    async fn resolve_client_contact(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientContact>, AppError> {
        self.get_contact(client_id).await
    }
}
