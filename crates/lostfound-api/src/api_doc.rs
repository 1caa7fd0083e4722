//! OpenAPI documentation.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use crate::services::PaymentIntent;
use lostfound_core::models;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lost & Found API",
        version = "0.1.0",
        description = "Hotel lost & found: guests report lost belongings, staff record what they find, and found items go back to their owners by pickup or paid delivery. All endpoints except the probes are under /api/v0/ and need a bearer token."
    ),
    paths(
        handlers::items::create_item,
        handlers::items::list_items,
        handlers::items::item_stats,
        handlers::items::get_item,
        handlers::items::update_item,
        handlers::items::delete_item,
        handlers::items::set_item_status,
        handlers::items::request_pickup,
        handlers::items::request_delivery,
        handlers::payments::create_delivery_intent,
        handlers::me::me,
        handlers::health::health_check,
        handlers::health::liveness_check,
    ),
    components(
        schemas(
            models::ItemStatus,
            models::Expiration,
            models::Section,
            models::Role,
            models::SessionContext,
            models::CreateItemRequest,
            models::UpdateItemRequest,
            models::SetStatusRequest,
            models::DeliveryAddress,
            models::DeliveryTicket,
            models::ItemResponse,
            models::StatusCount,
            models::DashboardStats,
            handlers::items::ItemListResponse,
            handlers::items::DeliveryRequestResponse,
            handlers::payments::DeliveryIntentRequest,
            handlers::health::HealthResponse,
            PaymentIntent,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "items", description = "Reporting, tracking and returning lost items"),
        (name = "payments", description = "Delivery fee payments"),
        (name = "session", description = "The caller's session"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_item_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v0/items"));
        assert!(doc.paths.paths.contains_key("/api/v0/items/{id}/status"));
        assert!(doc.paths.paths.contains_key("/api/v0/payments/delivery-intent"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
