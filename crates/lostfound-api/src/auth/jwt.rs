use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lostfound_core::models::{Role, SessionContext};
use lostfound_core::{AppError, Config};

use super::models::SessionClaims;

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
    staff_email_domain: Option<String>,
}

impl JwtService {
    pub fn new(secret: &str, expiry_hours: i64, staff_email_domain: Option<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
            staff_email_domain: staff_email_domain
                .map(|d| d.trim().trim_start_matches('@').to_ascii_lowercase())
                .filter(|d| !d.is_empty()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret(),
            config.jwt_expiry_hours(),
            config.staff_email_domain().map(str::to_string),
        )
    }

    /// Whether `email` may hold a staff session.
    pub fn is_staff_email(&self, email: &str) -> bool {
        match self.staff_email_domain {
            None => true,
            Some(ref domain) => email
                .rsplit_once('@')
                .map(|(_, host)| host.eq_ignore_ascii_case(domain))
                .unwrap_or(false),
        }
    }

    pub fn issue(&self, session: &SessionContext) -> Result<String, AppError> {
        if session.is_staff() && !self.is_staff_email(&session.email) {
            return Err(AppError::Forbidden(format!(
                "{} is not a staff address",
                session.email
            )));
        }
        if session.role == Role::Client && session.client_id.is_none() {
            return Err(AppError::InvalidInput(
                "A client session needs a client id".to_string(),
            ));
        }

        let now = Utc::now();
        let claims = SessionClaims {
            sub: session.subject.clone(),
            email: session.email.clone(),
            role: session.role,
            client_id: session.client_id.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<SessionContext, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data =
            decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::Unauthorized("Token has expired".to_string())
                    }
                    _ => AppError::Unauthorized("Invalid or expired token".to_string()),
                }
            })?;

        let session = token_data.claims.into_session()?;
        if session.is_staff() && !self.is_staff_email(&session.email) {
            return Err(AppError::Unauthorized(
                "Staff token issued outside the staff domain".to_string(),
            ));
        }
        Ok(session)
    }
}
