use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use lostfound_core::models::{
    CreateItemRequest, DashboardStats, DeliveryAddress, DeliveryTicket, ItemResponse,
    ListItemsQuery, SetStatusRequest, UpdateItemRequest,
};

use crate::auth::Session;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemListResponse {
    pub items: Vec<ItemResponse>,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryRequestResponse {
    pub item: ItemResponse,
    pub delivery: DeliveryTicket,
}

/// Report a lost item
#[utoipa::path(
    post,
    path = "/api/v0/items",
    tag = "items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item reported", body = ItemResponse),
        (status = 400, description = "Missing fields, bad status or bad image", body = ErrorResponse),
        (status = 409, description = "Item id already taken", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, session, request), fields(role = %session.role))]
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Session(session): Session,
    ValidatedJson(request): ValidatedJson<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), HttpAppError> {
    let item = state.lifecycle.create_item(&session, request).await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// List the items visible to the caller
#[utoipa::path(
    get,
    path = "/api/v0/items",
    tag = "items",
    params(ListItemsQuery),
    responses(
        (status = 200, description = "Visible items, newest first", body = ItemListResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, session), fields(role = %session.role))]
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Session(session): Session,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<ItemListResponse>, HttpAppError> {
    let items: Vec<ItemResponse> = state
        .lifecycle
        .list_visible(&session, &query)
        .await?
        .into_iter()
        .map(ItemResponse::from)
        .collect();

    Ok(Json(ItemListResponse {
        count: items.len(),
        items,
    }))
}

/// Dashboard figures
#[utoipa::path(
    get,
    path = "/api/v0/items/stats",
    tag = "items",
    responses(
        (status = 200, description = "Counts per status and recent activity", body = DashboardStats),
        (status = 403, description = "Staff only", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, session), fields(role = %session.role))]
pub async fn item_stats(
    State(state): State<Arc<AppState>>,
    Session(session): Session,
) -> Result<Json<DashboardStats>, HttpAppError> {
    Ok(Json(state.lifecycle.dashboard_stats(&session).await?))
}

#[utoipa::path(
    get,
    path = "/api/v0/items/{id}",
    tag = "items",
    params(("id" = String, Path, description = "Public item id")),
    responses(
        (status = 200, description = "Item", body = ItemResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, session), fields(role = %session.role))]
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Session(session): Session,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, HttpAppError> {
    let item = state.lifecycle.get_item(&session, &id).await?;
    Ok(Json(item.into()))
}

/// Edit an item's description fields
#[utoipa::path(
    patch,
    path = "/api/v0/items/{id}",
    tag = "items",
    params(("id" = String, Path, description = "Public item id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated item", body = ItemResponse),
        (status = 400, description = "Invalid field or status", body = ErrorResponse),
        (status = 403, description = "Staff only", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, session, request), fields(role = %session.role))]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Session(session): Session,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, HttpAppError> {
    let item = state.lifecycle.update_item(&session, &id, request).await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v0/items/{id}",
    tag = "items",
    params(("id" = String, Path, description = "Public item id")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 403, description = "Staff only", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, session), fields(role = %session.role))]
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Session(session): Session,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpAppError> {
    state.lifecycle.delete_item(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set an item's status to any of the five labels
#[utoipa::path(
    put,
    path = "/api/v0/items/{id}/status",
    tag = "items",
    params(("id" = String, Path, description = "Public item id")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Item with its new status", body = ItemResponse),
        (status = 400, description = "Unknown status label", body = ErrorResponse),
        (status = 403, description = "Staff only", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, session, request), fields(role = %session.role))]
pub async fn set_item_status(
    State(state): State<Arc<AppState>>,
    Session(session): Session,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<SetStatusRequest>,
) -> Result<Json<ItemResponse>, HttpAppError> {
    let item = state
        .lifecycle
        .set_status(&session, &id, &request.status)
        .await?;
    Ok(Json(item.into()))
}

/// Ask to collect a found item at the front desk
#[utoipa::path(
    post,
    path = "/api/v0/items/{id}/pickup",
    tag = "items",
    params(("id" = String, Path, description = "Public item id")),
    responses(
        (status = 200, description = "Pickup recorded", body = ItemResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 409, description = "Item is not waiting to be collected", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, session), fields(role = %session.role))]
pub async fn request_pickup(
    State(state): State<Arc<AppState>>,
    Session(session): Session,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, HttpAppError> {
    let item = state.lifecycle.request_pickup(&session, &id).await?;
    Ok(Json(item.into()))
}

/// Ask for a found item to be shipped
#[utoipa::path(
    post,
    path = "/api/v0/items/{id}/delivery",
    tag = "items",
    params(("id" = String, Path, description = "Public item id")),
    request_body = DeliveryAddress,
    responses(
        (status = 200, description = "Delivery recorded; pay against the returned reference", body = DeliveryRequestResponse),
        (status = 400, description = "Blank address fields", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 409, description = "Item is not waiting to be collected", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, session, address), fields(role = %session.role))]
pub async fn request_delivery(
    State(state): State<Arc<AppState>>,
    Session(session): Session,
    Path(id): Path<String>,
    ValidatedJson(address): ValidatedJson<DeliveryAddress>,
) -> Result<Json<DeliveryRequestResponse>, HttpAppError> {
    let (item, ticket) = state
        .lifecycle
        .request_delivery(&session, &id, address)
        .await?;
    Ok(Json(DeliveryRequestResponse {
        item: item.into(),
        delivery: ticket,
    }))
}
