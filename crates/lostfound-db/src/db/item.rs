use lostfound_core::{
    models::{ItemChanges, LostItem, NewLostItem},
    AppError, ItemScope, StatusFilter,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const ITEM_COLUMNS: &str = r#"
    storage_id, public_id, title, description, place_last_seen, date_last_seen,
    image, status, expiration, email, client_email, client_id,
    pickup_requested, pickup_requested_at,
    delivery_requested, delivery_requested_at,
    delivery_address, delivery_city, delivery_postal_code, delivery_phone,
    delivery_reference, delivery_paid, created_at, updated_at
"#;

/// Escapes LIKE wildcards so search text is matched literally.
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Repository for lost items. Every lookup is by the public id.
#[derive(Clone)]
pub struct LostItemRepository {
    pool: PgPool,
}

impl LostItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, item), fields(db.table = "lost_items", db.operation = "insert", item.id = %item.id))]
    pub async fn insert(&self, item: NewLostItem) -> Result<LostItem, AppError> {
        let sql = format!(
            r#"
            INSERT INTO lost_items (
                public_id, title, description, place_last_seen, date_last_seen,
                image, status, expiration, email, client_email, client_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );

        let result = sqlx::query_as::<Postgres, LostItem>(&sql)
            .bind(&item.id)
            .bind(&item.title)
            .bind(&item.description)
            .bind(&item.place_last_seen)
            .bind(item.date_last_seen)
            .bind(&item.image)
            .bind(item.status.as_str())
            .bind(item.expiration.as_str())
            .bind(&item.email)
            .bind(&item.client_email)
            .bind(&item.client_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from);

        match result {
            Ok(created) => {
                tracing::info!(item.id = %created.id, status = %created.status, "Lost item created");
                Ok(created)
            }
            Err(e) if e.is_unique_violation() => Err(AppError::Conflict(format!(
                "An item with id '{}' already exists",
                item.id
            ))),
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "lost_items", db.operation = "select", db.record_id = %storage_id))]
    pub async fn find_by_id(&self, storage_id: Uuid) -> Result<Option<LostItem>, AppError> {
        let sql = format!("SELECT {} FROM lost_items WHERE storage_id = $1", ITEM_COLUMNS);
        let item = sqlx::query_as::<Postgres, LostItem>(&sql)
            .bind(storage_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lost_items", db.operation = "select"))]
    pub async fn find_by_public_id(&self, public_id: &str) -> Result<Option<LostItem>, AppError> {
        let sql = format!("SELECT {} FROM lost_items WHERE public_id = $1", ITEM_COLUMNS);
        let item = sqlx::query_as::<Postgres, LostItem>(&sql)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lost_items", db.operation = "select"))]
    pub async fn find_by_delivery_reference(
        &self,
        reference: Uuid,
    ) -> Result<Option<LostItem>, AppError> {
        let sql = format!(
            "SELECT {} FROM lost_items WHERE delivery_reference = $1",
            ITEM_COLUMNS
        );
        let item = sqlx::query_as::<Postgres, LostItem>(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// Items matching a resolved visibility scope, newest first.
    #[tracing::instrument(skip(self), fields(db.table = "lost_items", db.operation = "select"))]
    pub async fn list(&self, scope: &ItemScope) -> Result<Vec<LostItem>, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM lost_items WHERE TRUE", ITEM_COLUMNS));

        match scope.statuses {
            StatusFilter::All => {}
            StatusFilter::Only(status) => {
                qb.push(" AND status = ").push_bind(status.as_str());
            }
            StatusFilter::Except(status) => {
                qb.push(" AND status <> ").push_bind(status.as_str());
            }
        }

        if let Some(ref client_id) = scope.client_id {
            qb.push(" AND client_id = ").push_bind(client_id.clone());
        }

        if let Some(date) = scope.date {
            qb.push(" AND date_last_seen = ").push_bind(date);
        }

        if let Some(ref text) = scope.text {
            let pattern = like_pattern(text);
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR place_last_seen ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        qb.push(" ORDER BY created_at DESC");

        let items = qb
            .build_query_as::<LostItem>()
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(count = items.len(), "Listed lost items");
        Ok(items)
    }

    /// Writes the given changes. Returns `None` when no item has that id.
    #[tracing::instrument(skip(self, changes), fields(db.table = "lost_items", db.operation = "update"))]
    pub async fn update_fields(
        &self,
        public_id: &str,
        changes: ItemChanges,
    ) -> Result<Option<LostItem>, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE lost_items SET updated_at = NOW()");

        if let Some(title) = changes.title {
            qb.push(", title = ").push_bind(title);
        }
        if let Some(description) = changes.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(place) = changes.place_last_seen {
            qb.push(", place_last_seen = ").push_bind(place);
        }
        if let Some(date) = changes.date_last_seen {
            qb.push(", date_last_seen = ").push_bind(date);
        }
        if let Some(image) = changes.image {
            qb.push(", image = ").push_bind(image);
        }
        if let Some(expiration) = changes.expiration {
            qb.push(", expiration = ").push_bind(expiration.as_str());
        }
        if let Some(status) = changes.status {
            qb.push(", status = ").push_bind(status.as_str());
        }
        if let Some(at) = changes.pickup_requested_at {
            qb.push(", pickup_requested = TRUE, pickup_requested_at = ")
                .push_bind(at);
        }
        if let Some(delivery) = changes.delivery {
            qb.push(", delivery_requested = TRUE, delivery_requested_at = ")
                .push_bind(delivery.requested_at)
                .push(", delivery_address = ")
                .push_bind(delivery.address)
                .push(", delivery_city = ")
                .push_bind(delivery.city)
                .push(", delivery_postal_code = ")
                .push_bind(delivery.postal_code)
                .push(", delivery_phone = ")
                .push_bind(delivery.phone)
                .push(", delivery_reference = ")
                .push_bind(delivery.reference);
        }

        qb.push(" WHERE public_id = ")
            .push_bind(public_id.to_string())
            .push(format!(" RETURNING {}", ITEM_COLUMNS));

        let item = qb
            .build_query_as::<LostItem>()
            .fetch_optional(&self.pool)
            .await?;

        if let Some(ref updated) = item {
            tracing::info!(item.id = %updated.id, status = %updated.status, "Lost item updated");
        }

        Ok(item)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lost_items", db.operation = "delete"))]
    pub async fn delete_by_public_id(&self, public_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM lost_items WHERE public_id = $1")
            .bind(public_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("wallet"), "%wallet%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
