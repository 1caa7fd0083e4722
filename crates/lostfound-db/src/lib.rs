//! Lost & Found Database Layer
//!
//! PostgreSQL repositories plus the storage traits the lifecycle service is
//! written against. Tests swap the traits for in-memory implementations.

pub mod db;
pub mod store_traits;

pub use db::{
    run_migrations, ClientRepository, LostItemRepository, NewTask, TaskRepository,
    TASK_NOTIFY_CHANNEL,
};
pub use store_traits::{ClientDirectory, ItemStore};
