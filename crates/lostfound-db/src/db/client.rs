use lostfound_core::{
    models::{Client, ClientContact},
    AppError,
};
use sqlx::{PgPool, Postgres};

/// Repository for the client directory
#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers a client, or refreshes the name and email of an existing one.
    #[tracing::instrument(skip(self), fields(db.table = "clients", db.operation = "upsert"))]
    pub async fn upsert_client(
        &self,
        id: &str,
        name: &str,
        email: &str,
    ) -> Result<Client, AppError> {
        let client = sqlx::query_as::<Postgres, Client>(
            r#"
            INSERT INTO clients (id, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    email = EXCLUDED.email
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(client)
    }

    #[tracing::instrument(skip(self), fields(db.table = "clients", db.operation = "select"))]
    pub async fn get_client(&self, id: &str) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<Postgres, Client>(
            "SELECT id, name, email, created_at FROM clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    #[tracing::instrument(skip(self), fields(db.table = "clients", db.operation = "select"))]
    pub async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<Postgres, Client>(
            "SELECT id, name, email, created_at FROM clients ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    #[tracing::instrument(skip(self), fields(db.table = "clients", db.operation = "select"))]
    pub async fn get_contact(&self, id: &str) -> Result<Option<ClientContact>, AppError> {
        let contact = sqlx::query_as::<Postgres, ClientContact>(
            "SELECT name, email FROM clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contact)
    }
}
