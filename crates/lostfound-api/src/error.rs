//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>` and use `?` on anything that
//! converts into [`AppError`]; the response shape and logging live here.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lostfound_core::{AppError, ErrorMetadata, LogLevel};
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether retrying the same request may succeed
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper so `AppError` can implement `IntoResponse` in this crate.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        // Body limit hits surface here when the request had no Content-Length.
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return HttpAppError(AppError::PayloadTooLarge(
                "Request body exceeds the configured size limit".to_string(),
            ));
        }
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that runs `validator` rules and answers with an
/// [`ErrorResponse`] on malformed or invalid input.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        inner.validate().map_err(AppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

/// Set once from `ENVIRONMENT`; production never echoes error chains.
static EXPOSE_DETAILS: std::sync::LazyLock<bool> = std::sync::LazyLock::new(|| {
    !std::env::var("ENVIRONMENT")
        .map(|env| matches!(env.to_ascii_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
});

impl ErrorResponse {
    pub fn from_app_error(app_error: &AppError, hide_details: bool) -> Self {
        let expose = !hide_details && !app_error.is_sensitive();
        ErrorResponse {
            error: app_error.client_message(),
            details: expose.then(|| app_error.detailed_message()),
            error_type: expose.then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        }
    }
}

impl HttpAppError {
    fn log(&self) {
        let error = &self.0;
        let code = error.error_code();
        match error.log_level() {
            LogLevel::Debug => tracing::debug!(error = %error, code, "Request rejected"),
            LogLevel::Warn => tracing::warn!(error = %error, code, "Request failed upstream"),
            LogLevel::Error => tracing::error!(error = %error.detailed_message(), code, "Request failed"),
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        self.log();
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::from_app_error(&self.0, !*EXPOSE_DETAILS);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_body() {
        let err = AppError::MissingFields(vec!["city".to_string(), "phone".to_string()]);
        let body = ErrorResponse::from_app_error(&err, false);
        assert_eq!(body.code, "MISSING_FIELDS");
        assert_eq!(body.error, "Missing required fields: city, phone");
        assert_eq!(body.error_type.as_deref(), Some("MissingFields"));
    }

    #[test]
    fn test_details_hidden_when_requested() {
        let err = AppError::NotFound("Item ITEM-1 not found".to_string());
        let body = ErrorResponse::from_app_error(&err, true);
        assert!(body.details.is_none());
        assert!(body.error_type.is_none());
        assert_eq!(body.error, "Item ITEM-1 not found");
    }

    #[test]
    fn test_sensitive_errors_never_carry_details() {
        let err = AppError::PaymentProvider("stripe said: invalid api key sk_live_x".to_string());
        let body = ErrorResponse::from_app_error(&err, false);
        assert!(body.details.is_none());
        assert_eq!(body.error, "Payment processing error");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::InvalidStatus("Lost".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::InvalidTransition("x".into()), StatusCode::CONFLICT),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::PayloadTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE),
        ];
        for (err, expected) in cases {
            assert_eq!(HttpAppError(err).into_response().status(), expected);
        }
    }
}
