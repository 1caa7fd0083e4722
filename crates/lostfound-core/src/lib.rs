//! Lost & Found Core Library
//!
//! This crate provides the domain models, lifecycle rules, error types and
//! configuration shared by every lost & found component.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod task_error;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use lifecycle::{ItemScope, StatusFilter};
pub use task_error::{TaskError, TaskResultExt};
