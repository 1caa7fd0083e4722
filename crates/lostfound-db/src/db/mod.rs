mod client;
mod item;
mod migrate;
mod task;

pub use client::ClientRepository;
pub use item::LostItemRepository;
pub use migrate::run_migrations;
pub use task::{NewTask, TaskRepository, TASK_NOTIFY_CHANNEL};
