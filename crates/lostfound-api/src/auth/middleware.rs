use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use lostfound_core::AppError;

use super::jwt::JwtService;
use crate::error::HttpAppError;

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))
}

/// Verifies the bearer token and attaches the session to the request.
pub async fn auth_middleware(
    State(jwt): State<Arc<JwtService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, HttpAppError> {
    let session = jwt.verify(bearer_token(request.headers())?)?;
    tracing::debug!(role = %session.role, subject = %session.subject, "Session authenticated");

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
