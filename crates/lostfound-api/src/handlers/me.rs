use axum::response::Json;
use lostfound_core::models::SessionContext;

use crate::auth::Session;

/// The session the bearer token stands for
#[utoipa::path(
    get,
    path = "/api/v0/me",
    tag = "session",
    responses(
        (status = 200, description = "Current session", body = SessionContext),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(Session(session): Session) -> Json<SessionContext> {
    Json(session)
}
