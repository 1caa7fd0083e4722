use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// A registered guest. `id` is the identity carried in client session tokens.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, PartialEq)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Where notifications for a client go
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct ClientContact {
    pub name: String,
    pub email: String,
}

impl From<Client> for ClientContact {
    fn from(client: Client) -> Self {
        ClientContact {
            name: client.name,
            email: client.email,
        }
    }
}

/// Request DTO for registering a client in the directory
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterClientRequest {
    #[validate(length(min = 1, max = 128, message = "Client id must be between 1 and 128 characters"))]
    pub id: String,
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
}
