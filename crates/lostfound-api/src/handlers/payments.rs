use axum::{extract::State, response::Json};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Session;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::PaymentIntent;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct DeliveryIntentRequest {
    /// Reference returned when the delivery was requested
    pub delivery_reference: Uuid,
}

/// Start paying the delivery fee for an item
#[utoipa::path(
    post,
    path = "/api/v0/payments/delivery-intent",
    tag = "payments",
    request_body = DeliveryIntentRequest,
    responses(
        (status = 200, description = "Payment handle for the checkout form", body = PaymentIntent),
        (status = 404, description = "Unknown delivery reference", body = ErrorResponse),
        (status = 409, description = "Item is no longer awaiting delivery", body = ErrorResponse),
        (status = 502, description = "Payment provider failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, session, request), fields(role = %session.role, delivery.reference = %request.delivery_reference))]
pub async fn create_delivery_intent(
    State(state): State<Arc<AppState>>,
    Session(session): Session,
    ValidatedJson(request): ValidatedJson<DeliveryIntentRequest>,
) -> Result<Json<PaymentIntent>, HttpAppError> {
    let item = state
        .lifecycle
        .payable_delivery(&session, request.delivery_reference)
        .await?;

    let settings = state.lifecycle.settings();
    let intent = state
        .payments
        .create_payment(
            request.delivery_reference,
            settings.delivery_fee_cents,
            &settings.currency,
        )
        .await?;

    tracing::info!(
        item.id = %item.id,
        amount_cents = intent.amount_cents,
        currency = %intent.currency,
        "Delivery payment intent created"
    );

    Ok(Json(intent))
}
