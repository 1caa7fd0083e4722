//! Wires repositories, the task queue and the lifecycle service together.

use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;

use lostfound_core::Config;
use lostfound_db::{ClientRepository, LostItemRepository, TaskRepository};
use lostfound_worker::{TaskHandlerContext, TaskQueue, TaskQueueConfig};

use crate::auth::JwtService;
use crate::services::payment::gateway_from_config;
use crate::services::{
    EmailService, LifecycleManager, LifecycleSettings, Mailer, TaskQueueEventPublisher,
};
use crate::state::AppState;
use crate::task_dispatch::TaskDispatcher;
use crate::task_handlers::NotificationTaskHandler;

pub async fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let items = Arc::new(LostItemRepository::new(pool.clone()));
    let clients = Arc::new(ClientRepository::new(pool.clone()));
    let task_repository = TaskRepository::new(pool.clone());

    let mailer: Option<Arc<dyn Mailer>> = match EmailService::from_config(config) {
        Some(service) => Some(Arc::new(service)),
        None => {
            tracing::warn!("SMTP not configured, notification tasks will fail without retry");
            None
        }
    };
    if config.staff_notification_email().is_none() {
        tracing::warn!("STAFF_NOTIFICATION_EMAIL not set, staff will not be mailed about pickups and deliveries");
    }

    let task_dispatcher = Arc::new(TaskDispatcher::new(NotificationTaskHandler::new(
        clients,
        mailer,
        config.frontend_url(),
        config.staff_notification_email().map(str::to_string),
    )));
    let context: Arc<dyn TaskHandlerContext> = task_dispatcher.clone();

    let task_queue = TaskQueue::new(
        task_repository,
        TaskQueueConfig::from(config),
        Arc::downgrade(&context),
        Some(pool),
    );
    tracing::info!(
        workers = config.task_worker_count(),
        "Task queue started"
    );

    let lifecycle = LifecycleManager::new(
        items.clone(),
        Arc::new(TaskQueueEventPublisher::new(task_queue.clone())),
        LifecycleSettings::from(config),
    );

    let payments = gateway_from_config(config)?;

    Ok(Arc::new(AppState {
        config: config.clone(),
        lifecycle,
        items,
        payments,
        jwt: Arc::new(JwtService::from_config(config)),
        task_queue: Some(task_queue),
        task_dispatcher: Some(task_dispatcher),
    }))
}
