//! Background task queue for lost & found notifications.
//!
//! Lifecycle writes enqueue tasks here; the worker pool claims them and hands
//! them to a [`TaskHandlerContext`] owned by the API.

pub mod context;
pub mod queue;

pub use context::TaskHandlerContext;
pub use queue::{TaskQueue, TaskQueueConfig, MAX_RETRY_BACKOFF_SECS};
