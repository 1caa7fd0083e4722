//! In-memory stand-ins for the database, mail relay and payment provider.
//!
//! Compiled for unit tests and for integration tests through the
//! `test-helpers` feature.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use lostfound_core::models::{
    task_for_event, ClientContact, ItemChanges, ItemEvent, LostItem, NewLostItem, Priority, Task,
    TaskStatus,
};
use lostfound_core::{AppError, Config, ItemScope, ServiceConfig};
use lostfound_db::{ClientDirectory, ItemStore};

use crate::auth::JwtService;
use crate::services::notifications::OutgoingMail;
use crate::services::{
    EventPublisher, LifecycleManager, LifecycleSettings, Mailer, PaymentGateway, PaymentIntent,
};
use crate::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hs256";
pub const TEST_STAFF_DOMAIN: &str = "hotel.example";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct InMemoryItemStore {
    items: Mutex<Vec<LostItem>>,
}

impl InMemoryItemStore {
    pub fn with_items(items: Vec<LostItem>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    pub fn snapshot(&self) -> Vec<LostItem> {
        lock(&self.items).clone()
    }

    pub fn get(&self, public_id: &str) -> Option<LostItem> {
        lock(&self.items).iter().find(|i| i.id == public_id).cloned()
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn insert(&self, item: NewLostItem) -> Result<LostItem, AppError> {
        let mut items = lock(&self.items);
        if items.iter().any(|i| i.id == item.id) {
            return Err(AppError::Conflict(format!(
                "An item with id {} already exists",
                item.id
            )));
        }
        let now = Utc::now();
        let stored = LostItem {
            storage_id: Uuid::new_v4(),
            id: item.id,
            title: item.title,
            description: item.description,
            place_last_seen: item.place_last_seen,
            date_last_seen: item.date_last_seen,
            image: item.image,
            status: item.status,
            expiration: item.expiration,
            email: item.email,
            client_email: item.client_email,
            client_id: item.client_id,
            pickup_requested: false,
            pickup_requested_at: None,
            delivery_requested: false,
            delivery_requested_at: None,
            delivery_address: None,
            delivery_city: None,
            delivery_postal_code: None,
            delivery_phone: None,
            delivery_reference: None,
            delivery_paid: false,
            created_at: now,
            updated_at: now,
        };
        items.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, storage_id: Uuid) -> Result<Option<LostItem>, AppError> {
        Ok(lock(&self.items)
            .iter()
            .find(|i| i.storage_id == storage_id)
            .cloned())
    }

    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<LostItem>, AppError> {
        Ok(self.get(public_id))
    }

    async fn find_by_delivery_reference(
        &self,
        reference: Uuid,
    ) -> Result<Option<LostItem>, AppError> {
        Ok(lock(&self.items)
            .iter()
            .find(|i| i.delivery_reference == Some(reference))
            .cloned())
    }

    async fn list(&self, scope: &ItemScope) -> Result<Vec<LostItem>, AppError> {
        let mut items: Vec<LostItem> = lock(&self.items)
            .iter()
            .filter(|i| scope.matches(i))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn update_fields(
        &self,
        public_id: &str,
        changes: ItemChanges,
    ) -> Result<Option<LostItem>, AppError> {
        let mut items = lock(&self.items);
        Ok(items.iter_mut().find(|i| i.id == public_id).map(|item| {
            changes.apply_to(item, Utc::now());
            item.clone()
        }))
    }

    async fn delete_by_public_id(&self, public_id: &str) -> Result<bool, AppError> {
        let mut items = lock(&self.items);
        let before = items.len();
        items.retain(|i| i.id != public_id);
        Ok(items.len() != before)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryClientDirectory {
    contacts: HashMap<String, ClientContact>,
}

impl InMemoryClientDirectory {
    pub fn with_client(mut self, id: &str, name: &str, email: &str) -> Self {
        self.contacts.insert(
            id.to_string(),
            ClientContact {
                name: name.to_string(),
                email: email.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl ClientDirectory for InMemoryClientDirectory {
    async fn resolve_client_contact(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientContact>, AppError> {
        Ok(self.contacts.get(client_id).cloned())
    }
}

/// Keeps every published event; optionally refuses them all.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<ItemEvent>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<ItemEvent> {
        lock(&self.events).clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: ItemEvent) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::Internal("event bus unavailable".to_string()));
        }
        lock(&self.events).push(event);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        if self.fail {
            return Err("connection refused".to_string());
        }
        lock(&self.sent).push(OutgoingMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Hands out a deterministic intent per reference and records the calls.
#[derive(Default)]
pub struct StaticPaymentGateway {
    calls: Mutex<Vec<(Uuid, i64, String)>>,
}

impl StaticPaymentGateway {
    pub fn calls(&self) -> Vec<(Uuid, i64, String)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl PaymentGateway for StaticPaymentGateway {
    async fn create_payment(
        &self,
        reference: Uuid,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentIntent, AppError> {
        lock(&self.calls).push((reference, amount_cents, currency.to_string()));
        Ok(PaymentIntent {
            amount_cents,
            currency: currency.to_string(),
            client_secret: format!("pi_test_secret_{}", reference.simple()),
        })
    }
}

/// Builds the task the queue would store for an event.
pub fn task_for(event: &ItemEvent) -> Task {
    let (task_type, payload) = task_for_event(event).unwrap_or_else(|e| panic!("{}", e));
    let now = Utc::now();
    Task {
        id: Uuid::new_v4(),
        task_type,
        status: TaskStatus::Running,
        priority: Priority::Normal.as_i32(),
        payload,
        result: None,
        scheduled_at: now,
        started_at: Some(now),
        completed_at: None,
        retry_count: 0,
        max_retries: 5,
        timeout_seconds: Some(60),
        created_at: now,
        updated_at: now,
    }
}

pub fn test_config() -> Config {
    let mut config = ServiceConfig::default();
    config.base.jwt_secret = TEST_JWT_SECRET.to_string();
    config.staff_email_domain = Some(TEST_STAFF_DOMAIN.to_string());
    config.frontend_url = "https://lostfound.example".to_string();
    config.staff_notification_email = Some(format!("desk@{}", TEST_STAFF_DOMAIN));
    config.into()
}

/// The doubles behind a test [`AppState`], kept for assertions.
pub struct TestBackends {
    pub store: Arc<InMemoryItemStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub payments: Arc<StaticPaymentGateway>,
}

impl Default for TestBackends {
    fn default() -> Self {
        Self {
            store: Arc::new(InMemoryItemStore::default()),
            publisher: Arc::new(RecordingPublisher::default()),
            payments: Arc::new(StaticPaymentGateway::default()),
        }
    }
}

impl TestBackends {
    pub fn with_items(items: Vec<LostItem>) -> Self {
        Self {
            store: Arc::new(InMemoryItemStore::with_items(items)),
            ..Default::default()
        }
    }

    /// App state wired to these doubles, without a database or task queue.
    pub fn state(&self, config: Config) -> Arc<AppState> {
        let lifecycle = LifecycleManager::new(
            self.store.clone(),
            self.publisher.clone(),
            LifecycleSettings::from(&config),
        );
        Arc::new(AppState {
            jwt: Arc::new(JwtService::from_config(&config)),
            lifecycle,
            items: self.store.clone(),
            payments: self.payments.clone(),
            task_queue: None,
            task_dispatcher: None,
            config,
        })
    }
}
