use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

use super::item::LostItem;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Hotel employee
    Staff,
    /// Guest
    Client,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Role::Staff => write!(f, "staff"),
            Role::Client => write!(f, "client"),
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(Role::Staff),
            "client" => Ok(Role::Client),
            _ => Err(anyhow::anyhow!("Invalid role: {}", s)),
        }
    }
}

/// Who is acting. Built per request from the bearer token and handed to
/// every lifecycle operation.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct SessionContext {
    pub role: Role,
    pub subject: String,
    pub email: String,
    /// Always set for clients, never for staff
    pub client_id: Option<String>,
}

impl SessionContext {
    pub fn staff(subject: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            role: Role::Staff,
            subject: subject.into(),
            email: email.into(),
            client_id: None,
        }
    }

    pub fn client(client_id: impl Into<String>, email: impl Into<String>) -> Self {
        let client_id = client_id.into();
        Self {
            role: Role::Client,
            subject: client_id.clone(),
            email: email.into(),
            client_id: Some(client_id),
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    /// Staff may act on any item; a client only on items carrying their id.
    pub fn can_access(&self, item: &LostItem) -> bool {
        match self.role {
            Role::Staff => true,
            Role::Client => {
                self.client_id.is_some() && item.client_id.as_deref() == self.client_id.as_deref()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("staff".parse::<Role>().unwrap(), Role::Staff);
        assert_eq!("client".parse::<Role>().unwrap(), Role::Client);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::Client.to_string(), "client");
    }

    #[test]
    fn test_client_session_carries_client_id() {
        let session = SessionContext::client("c1", "guest@example.com");
        assert_eq!(session.client_id.as_deref(), Some("c1"));
        assert_eq!(session.subject, "c1");
        assert!(!session.is_staff());
    }
}
