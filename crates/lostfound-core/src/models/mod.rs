//! Data models for the application

mod client;
mod event;
mod item;
mod session;
mod task;

pub use client::*;
pub use event::*;
pub use item::*;
pub use session::*;
pub use task::*;
