//! Background task failures.
//!
//! A handler returns [`TaskError`] to tell the queue whether the failure is
//! worth retrying. Notification failures are reported this way: they never
//! reach the caller that changed the item.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    /// Retried with backoff (SMTP timeout, relay refusing connections).
    #[error("{0}")]
    Transient(anyhow::Error),

    /// Fails the task at once (missing contact record, mail disabled, bad payload).
    #[error("{0}")]
    Permanent(anyhow::Error),
}

impl TaskError {
    pub fn unrecoverable(err: impl Into<anyhow::Error>) -> Self {
        TaskError::Permanent(err.into())
    }

    pub fn recoverable(err: impl Into<anyhow::Error>) -> Self {
        TaskError::Transient(err.into())
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, TaskError::Transient(_))
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        TaskError::Transient(err)
    }
}

/// Marks a failed result as not worth retrying.
pub trait TaskResultExt<T> {
    fn unrecoverable(self) -> Result<T, TaskError>;
}

impl<T, E: Into<anyhow::Error>> TaskResultExt<T> for Result<T, E> {
    fn unrecoverable(self) -> Result<T, TaskError> {
        self.map_err(TaskError::unrecoverable)
    }
}
