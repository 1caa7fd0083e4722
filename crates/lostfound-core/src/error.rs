//! Error types module
//!
//! All failures surfaced to callers are unified under [`AppError`]. Each
//! variant describes its own HTTP presentation through [`ErrorMetadata`], so
//! the API layer never has to special-case domain errors.

use std::io;

use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors such as validation failures
    Debug,
    /// Recoverable issues or upstream hiccups
    Warn,
    /// Unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "INVALID_STATUS")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// How a variant is presented to callers and operators.
#[derive(Debug, Clone, Copy)]
struct Presentation {
    status: u16,
    code: &'static str,
    retry: bool,
    hint: Option<&'static str>,
    hide_details: bool,
    level: LogLevel,
}

impl Presentation {
    const fn caller(status: u16, code: &'static str, hint: &'static str) -> Self {
        Presentation {
            status,
            code,
            retry: false,
            hint: Some(hint),
            hide_details: false,
            level: LogLevel::Debug,
        }
    }

    const fn server(status: u16, code: &'static str, retry: bool, hint: &'static str) -> Self {
        Presentation {
            status,
            code,
            retry,
            hint: Some(hint),
            hide_details: true,
            level: LogLevel::Error,
        }
    }
}

const RETRY_SHORTLY: &str = "Retry after a short delay";

impl AppError {
    fn presentation(&self) -> Presentation {
        match self {
            AppError::Database(_) => Presentation::server(500, "DATABASE_ERROR", true, RETRY_SHORTLY),
            AppError::InvalidStatus(_) => Presentation::caller(
                400,
                "INVALID_STATUS",
                "Use one of: Declared by client, Found by staff, Pickup requested, Delivery requested, Delivered",
            ),
            AppError::MissingFields(_) => Presentation::caller(
                400,
                "MISSING_FIELDS",
                "Fill in every required field and resubmit",
            ),
            AppError::NotFound(_) => Presentation::caller(404, "NOT_FOUND", "Verify the item ID exists"),
            AppError::InvalidTransition(_) => Presentation::caller(
                409,
                "INVALID_TRANSITION",
                "Reload the item and check its current status",
            ),
            AppError::InvalidInput(_) => Presentation::caller(
                400,
                "INVALID_INPUT",
                "Check request parameters and try again",
            ),
            AppError::Conflict(_) => Presentation::caller(409, "CONFLICT", "Use a different identifier"),
            AppError::PayloadTooLarge(_) => Presentation::caller(
                413,
                "PAYLOAD_TOO_LARGE",
                "Attach a smaller image or link to a hosted one",
            ),
            AppError::Unauthorized(_) => Presentation::caller(
                401,
                "UNAUTHORIZED",
                "Check the authentication token",
            ),
            AppError::Forbidden(_) => Presentation::caller(
                403,
                "FORBIDDEN",
                "This action requires a staff account",
            ),
            AppError::PaymentProvider(_) => Presentation {
                level: LogLevel::Warn,
                ..Presentation::server(502, "PAYMENT_PROVIDER_ERROR", true, "Retry payment after a short delay")
            },
            AppError::Config(_) => Presentation::server(
                500,
                "CONFIGURATION_ERROR",
                false,
                "Contact the front desk if this persists",
            ),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                Presentation::server(500, "INTERNAL_ERROR", true, RETRY_SHORTLY)
            }
        }
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::InvalidStatus(_) => "InvalidStatus",
            AppError::MissingFields(_) => "MissingFields",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidTransition(_) => "InvalidTransition",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Conflict(_) => "Conflict",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::PaymentProvider(_) => "PaymentProvider",
            AppError::Config(_) => "Config",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }

    /// True when the error is the unique-violation raised by a duplicate key.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(SqlxError::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        self.presentation().status
    }

    fn error_code(&self) -> &'static str {
        self.presentation().code
    }

    fn is_recoverable(&self) -> bool {
        self.presentation().retry
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.presentation().hint
    }

    fn is_sensitive(&self) -> bool {
        self.presentation().hide_details
    }

    fn log_level(&self) -> LogLevel {
        self.presentation().level
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::InvalidStatus(ref value) => format!("'{}' is not a valid item status", value),
            AppError::MissingFields(ref fields) => {
                format!("Missing required fields: {}", fields.join(", "))
            }
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::InvalidTransition(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Conflict(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Forbidden(ref msg) => msg.clone(),
            AppError::PaymentProvider(_) => "Payment processing error".to_string(),
            AppError::Config(_) => "Service is not configured for this operation".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
