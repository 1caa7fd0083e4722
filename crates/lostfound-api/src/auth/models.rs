use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use lostfound_core::models::{Role, SessionContext};
use lostfound_core::AppError;
use serde::{Deserialize, Serialize};

use crate::error::HttpAppError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    /// Turns verified claims into a session. Client tokens must name a client.
    pub fn into_session(self) -> Result<SessionContext, AppError> {
        match self.role {
            Role::Staff => Ok(SessionContext::staff(self.sub, self.email)),
            Role::Client => {
                let client_id = self
                    .client_id
                    .filter(|id| !id.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::Unauthorized("Client token carries no client id".to_string())
                    })?;
                Ok(SessionContext::client(client_id, self.email))
            }
        }
    }
}

/// Extractor for the session the auth middleware attached to the request.
#[derive(Debug, Clone)]
pub struct Session(pub SessionContext);

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .map(Session)
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing session context".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role, client_id: Option<&str>) -> SessionClaims {
        SessionClaims {
            sub: "sub-1".to_string(),
            email: "someone@example.com".to_string(),
            role,
            client_id: client_id.map(str::to_string),
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn test_client_claims_require_client_id() {
        assert!(matches!(
            claims(Role::Client, None).into_session(),
            Err(AppError::Unauthorized(_))
        ));
        assert!(claims(Role::Client, Some("  ")).into_session().is_err());

        let session = claims(Role::Client, Some("c1")).into_session().unwrap();
        assert_eq!(session.client_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_staff_claims_drop_client_id() {
        let session = claims(Role::Staff, Some("c1")).into_session().unwrap();
        assert!(session.is_staff());
        assert!(session.client_id.is_none());
    }
}
