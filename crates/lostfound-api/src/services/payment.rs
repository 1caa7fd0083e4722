//! Payment intents for delivery fees.
//!
//! Only intent creation lives here; completion is confirmed by the provider's
//! own checkout flow.

use async_trait::async_trait;
use lostfound_core::{AppError, Config};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

/// Handle the frontend needs to collect a payment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PaymentIntent {
    pub amount_cents: i64,
    pub currency: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment(
        &self,
        reference: Uuid,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentIntent, AppError>;
}

/// Builds the gateway the configuration asks for.
pub fn gateway_from_config(config: &Config) -> Result<Arc<dyn PaymentGateway>, AppError> {
    match config.stripe_secret_key() {
        Some(key) => Ok(Arc::new(StripePaymentGateway::new(
            key,
            config.stripe_api_base(),
        )?)),
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set, delivery payments disabled");
            Ok(Arc::new(DisabledPaymentGateway))
        }
    }
}

/// Used when no provider key is configured.
pub struct DisabledPaymentGateway;

#[async_trait]
impl PaymentGateway for DisabledPaymentGateway {
    async fn create_payment(
        &self,
        _reference: Uuid,
        _amount_cents: i64,
        _currency: &str,
    ) -> Result<PaymentIntent, AppError> {
        Err(AppError::PaymentProvider(
            "No payment provider is configured".to_string(),
        ))
    }
}

#[derive(Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: Option<String>,
    amount: i64,
    currency: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeError,
}

#[derive(Deserialize)]
struct StripeError {
    message: Option<String>,
}

pub struct StripePaymentGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripePaymentGateway {
    pub fn new(secret_key: &str, api_base: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripePaymentGateway {
    #[tracing::instrument(skip(self), fields(provider = "stripe"))]
    async fn create_payment(
        &self,
        reference: Uuid,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentIntent, AppError> {
        let reference = reference.to_string();
        let amount = amount_cents.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", currency),
            ("automatic_payment_methods[enabled]", "true"),
            ("metadata[delivery_reference]", reference.as_str()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            // Retrying the same delivery returns the same intent.
            .header("Idempotency-Key", format!("delivery-{}", reference))
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::PaymentProvider(format!("Request to Stripe failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<StripeErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| "no error message".to_string());
            return Err(AppError::PaymentProvider(format!(
                "Stripe returned {}: {}",
                status, message
            )));
        }

        let intent: StripePaymentIntent = response.json().await.map_err(|e| {
            AppError::PaymentProvider(format!("Unreadable Stripe response: {}", e))
        })?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            AppError::PaymentProvider(format!("Payment intent {} has no client secret", intent.id))
        })?;

        tracing::info!(intent.id = %intent.id, amount = intent.amount, "Payment intent created");

        Ok(PaymentIntent {
            amount_cents: intent.amount,
            currency: intent.currency,
            client_secret,
        })
    }
}
