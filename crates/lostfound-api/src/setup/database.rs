use anyhow::{Context, Result};
use lostfound_core::Config;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

const IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);

/// Opens the item store and brings its schema up to date.
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    let options = PgConnectOptions::from_str(config.database_url())
        .context("DATABASE_URL is not a valid Postgres URL")?
        .application_name("lostfound-api");

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .connect_with(options)
        .await
        .context("Failed to connect to the item store")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Item store connected"
    );

    lostfound_db::run_migrations(&pool).await?;
    Ok(pool)
}
