//! Application state shared by every handler.

use std::sync::Arc;

use lostfound_core::Config;
use lostfound_db::ItemStore;
use lostfound_worker::TaskQueue;

use crate::auth::JwtService;
use crate::services::{LifecycleManager, PaymentGateway};
use crate::task_dispatch::TaskDispatcher;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub lifecycle: LifecycleManager,
    /// Also used directly by the health check
    pub items: Arc<dyn ItemStore>,
    pub payments: Arc<dyn PaymentGateway>,
    pub jwt: Arc<JwtService>,
    /// `None` when the app runs without background workers (tests)
    pub task_queue: Option<TaskQueue>,
    /// The worker pool only holds this weakly; the state keeps it alive.
    #[allow(dead_code)]
    pub task_dispatcher: Option<Arc<TaskDispatcher>>,
}
