//! Configuration module
//!
//! Every setting is read from the environment (after loading `.env`) and
//! falls back to a constant default. `validate()` rejects combinations that
//! would only fail later at runtime.

use std::env;

const SERVER_PORT: u16 = 3001;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 24;
const MAX_IMAGE_SIZE_MB: usize = 10;
const DELIVERY_FEE_CENTS: i64 = 1500;
const PAYMENT_CURRENCY: &str = "usd";
const STRIPE_API_BASE: &str = "https://api.stripe.com";
const TASK_WORKER_COUNT: usize = 2;
const TASK_POLL_INTERVAL_MS: u64 = 1000;
const TASK_MAX_RETRIES: i32 = 5;
const TASK_TIMEOUT_SECONDS: i32 = 60;
const STALE_TASK_REAP_INTERVAL_SECS: u64 = 60;
const STALE_TASK_GRACE_PERIOD_SECS: i64 = 120;

/// Settings shared by the HTTP service and the CLI
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub environment: String,
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    /// Staff tokens are only issued for addresses in this domain (e.g. `hotel.example`)
    pub staff_email_domain: Option<String>,
    pub max_image_size_bytes: usize,
    // Outbound mail
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    pub staff_notification_email: Option<String>,
    pub frontend_url: String,
    // Delivery payments
    pub delivery_fee_cents: i64,
    pub payment_currency: String,
    pub stripe_secret_key: Option<String>,
    pub stripe_api_base: String,
    // Task queue
    pub task_worker_count: usize,
    pub task_poll_interval_ms: u64,
    pub task_max_retries: i32,
    pub task_timeout_seconds: i32,
    /// 0 disables the stale task reaper
    pub task_stale_reap_interval_secs: u64,
    pub task_stale_grace_period_secs: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig {
                server_port: SERVER_PORT,
                cors_origins: vec!["*".to_string()],
                database_url: "postgresql://localhost/lostfound".to_string(),
                db_max_connections: MAX_CONNECTIONS,
                db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
                jwt_secret: String::new(),
                jwt_expiry_hours: JWT_EXPIRY_HOURS,
                environment: "development".to_string(),
            },
            staff_email_domain: None,
            max_image_size_bytes: MAX_IMAGE_SIZE_MB * 1024 * 1024,
            smtp_host: None,
            smtp_port: None,
            smtp_user: None,
            smtp_password: None,
            smtp_from: None,
            smtp_tls: true,
            staff_notification_email: None,
            frontend_url: "http://localhost:5173".to_string(),
            delivery_fee_cents: DELIVERY_FEE_CENTS,
            payment_currency: PAYMENT_CURRENCY.to_string(),
            stripe_secret_key: None,
            stripe_api_base: STRIPE_API_BASE.to_string(),
            task_worker_count: TASK_WORKER_COUNT,
            task_poll_interval_ms: TASK_POLL_INTERVAL_MS,
            task_max_retries: TASK_MAX_RETRIES,
            task_timeout_seconds: TASK_TIMEOUT_SECONDS,
            task_stale_reap_interval_secs: STALE_TASK_REAP_INTERVAL_SECS,
            task_stale_grace_period_secs: STALE_TASK_GRACE_PERIOD_SECS,
        }
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = Self::from_env_unchecked()?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the environment without `validate()`. For tools that only
    /// need part of the settings, such as running migrations.
    pub fn from_env_unchecked() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: parsed_var("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: parsed_var("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_default(),
            jwt_expiry_hours: parsed_var("JWT_EXPIRY_HOURS", JWT_EXPIRY_HOURS),
            environment,
        };

        let max_image_size_mb: usize = parsed_var("MAX_IMAGE_SIZE_MB", MAX_IMAGE_SIZE_MB);

        let config = ServiceConfig {
            base,
            staff_email_domain: optional_var("STAFF_EMAIL_DOMAIN")
                .map(|d| d.trim_start_matches('@').to_lowercase()),
            max_image_size_bytes: max_image_size_mb * 1024 * 1024,
            smtp_host: optional_var("SMTP_HOST"),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&p| p > 0),
            smtp_user: optional_var("SMTP_USER"),
            smtp_password: optional_var("SMTP_PASSWORD"),
            smtp_from: optional_var("SMTP_FROM"),
            smtp_tls: env::var("SMTP_TLS")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            staff_notification_email: optional_var("STAFF_NOTIFICATION_EMAIL"),
            frontend_url: optional_var("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            delivery_fee_cents: parsed_var("DELIVERY_FEE_CENTS", DELIVERY_FEE_CENTS),
            payment_currency: optional_var("PAYMENT_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or_else(|| PAYMENT_CURRENCY.to_string()),
            stripe_secret_key: optional_var("STRIPE_SECRET_KEY"),
            stripe_api_base: optional_var("STRIPE_API_BASE")
                .unwrap_or_else(|| STRIPE_API_BASE.to_string()),
            task_worker_count: parsed_var("TASK_WORKER_COUNT", TASK_WORKER_COUNT),
            task_poll_interval_ms: parsed_var("TASK_POLL_INTERVAL_MS", TASK_POLL_INTERVAL_MS),
            task_max_retries: parsed_var("TASK_MAX_RETRIES", TASK_MAX_RETRIES),
            task_timeout_seconds: parsed_var("TASK_TIMEOUT_SECONDS", TASK_TIMEOUT_SECONDS),
            task_stale_reap_interval_secs: parsed_var(
                "TASK_STALE_REAP_INTERVAL_SECS",
                STALE_TASK_REAP_INTERVAL_SECS,
            ),
            task_stale_grace_period_secs: parsed_var(
                "TASK_STALE_GRACE_PERIOD_SECS",
                STALE_TASK_GRACE_PERIOD_SECS,
            ),
        };

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.base.database_url.starts_with("postgres://")
            && !self.base.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.smtp_host.is_some() && self.smtp_from.is_none() {
            return Err(anyhow::anyhow!("SMTP_HOST requires SMTP_FROM to be set"));
        }

        if self.delivery_fee_cents <= 0 {
            return Err(anyhow::anyhow!("DELIVERY_FEE_CENTS must be positive"));
        }

        if self.task_worker_count == 0 {
            return Err(anyhow::anyhow!("TASK_WORKER_COUNT must be at least 1"));
        }

        Ok(())
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Config(Box::new(ServiceConfig::from_env()?)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.0.validate()
    }

    pub fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    pub fn is_production(&self) -> bool {
        self.0.is_production()
    }

    pub fn server_port(&self) -> u16 {
        self.0.base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.0.base.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.0.base.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.0.base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.0.base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.0.base.jwt_secret
    }

    pub fn jwt_expiry_hours(&self) -> i64 {
        self.0.base.jwt_expiry_hours
    }

    pub fn staff_email_domain(&self) -> Option<&str> {
        self.0.staff_email_domain.as_deref()
    }

    pub fn max_image_size_bytes(&self) -> usize {
        self.0.max_image_size_bytes
    }

    pub fn smtp_host(&self) -> Option<&str> {
        self.0.smtp_host.as_deref()
    }

    pub fn smtp_port(&self) -> Option<u16> {
        self.0.smtp_port
    }

    pub fn smtp_user(&self) -> Option<&str> {
        self.0.smtp_user.as_deref()
    }

    pub fn smtp_password(&self) -> Option<&str> {
        self.0.smtp_password.as_deref()
    }

    pub fn smtp_from(&self) -> Option<&str> {
        self.0.smtp_from.as_deref()
    }

    pub fn smtp_tls(&self) -> bool {
        self.0.smtp_tls
    }

    pub fn staff_notification_email(&self) -> Option<&str> {
        self.0.staff_notification_email.as_deref()
    }

    pub fn frontend_url(&self) -> &str {
        &self.0.frontend_url
    }

    pub fn delivery_fee_cents(&self) -> i64 {
        self.0.delivery_fee_cents
    }

    pub fn payment_currency(&self) -> &str {
        &self.0.payment_currency
    }

    pub fn stripe_secret_key(&self) -> Option<&str> {
        self.0.stripe_secret_key.as_deref()
    }

    pub fn stripe_api_base(&self) -> &str {
        &self.0.stripe_api_base
    }

    pub fn task_worker_count(&self) -> usize {
        self.0.task_worker_count
    }

    pub fn task_poll_interval_ms(&self) -> u64 {
        self.0.task_poll_interval_ms
    }

    pub fn task_max_retries(&self) -> i32 {
        self.0.task_max_retries
    }

    pub fn task_timeout_seconds(&self) -> i32 {
        self.0.task_timeout_seconds
    }

    pub fn task_stale_reap_interval_secs(&self) -> u64 {
        self.0.task_stale_reap_interval_secs
    }

    pub fn task_stale_grace_period_secs(&self) -> i64 {
        self.0.task_stale_grace_period_secs
    }
}

impl From<ServiceConfig> for Config {
    fn from(config: ServiceConfig) -> Self {
        Config(Box::new(config))
    }
}
