//! Lost & Found API Library
//!
//! HTTP handlers, the lifecycle service, notification task handlers and the
//! application setup.

mod api_doc;
pub mod constants;
mod handlers;
pub mod services;
pub mod setup;
pub mod task_dispatch;
pub mod task_handlers;

pub mod auth;
pub mod error;
pub mod state;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use error::ErrorResponse;
pub use lostfound_worker::{TaskQueue, TaskQueueConfig};
pub use services::LifecycleManager;
pub use setup::routes::setup_routes;
pub use task_handlers::{NotificationTaskHandler, TaskHandler};
