//! Bearer-token sessions.
//!
//! Tokens are HS256 JWTs minted by the operator CLI. The middleware turns a
//! valid token into a [`SessionContext`](lostfound_core::models::SessionContext)
//! and handlers pull it out with the [`Session`] extractor.

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::JwtService;
pub use middleware::auth_middleware;
pub use models::{Session, SessionClaims};
