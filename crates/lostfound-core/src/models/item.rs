use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Lifecycle state of a lost item.
///
/// The wire and column representation is the human-readable label, which is
/// what staff pick from and what guests see.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub enum ItemStatus {
    #[serde(rename = "Declared by client")]
    DeclaredByClient,
    #[serde(rename = "Found by staff")]
    FoundByStaff,
    #[serde(rename = "Pickup requested")]
    PickupRequested,
    #[serde(rename = "Delivery requested")]
    DeliveryRequested,
    #[serde(rename = "Delivered")]
    Delivered,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 5] = [
        ItemStatus::DeclaredByClient,
        ItemStatus::FoundByStaff,
        ItemStatus::PickupRequested,
        ItemStatus::DeliveryRequested,
        ItemStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::DeclaredByClient => "Declared by client",
            ItemStatus::FoundByStaff => "Found by staff",
            ItemStatus::PickupRequested => "Pickup requested",
            ItemStatus::DeliveryRequested => "Delivery requested",
            ItemStatus::Delivered => "Delivered",
        }
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::InvalidStatus(s.to_string()))
    }
}

/// Advisory retention tag. Nothing expires items automatically.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub enum Expiration {
    #[serde(rename = "1 month")]
    OneMonth,
    #[serde(rename = "1 year")]
    OneYear,
    #[default]
    #[serde(rename = "unlimited")]
    Unlimited,
}

impl Expiration {
    pub fn as_str(&self) -> &'static str {
        match self {
            Expiration::OneMonth => "1 month",
            Expiration::OneYear => "1 year",
            Expiration::Unlimited => "unlimited",
        }
    }
}

impl Display for Expiration {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Expiration {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1 month" => Ok(Expiration::OneMonth),
            "1 year" => Ok(Expiration::OneYear),
            "unlimited" => Ok(Expiration::Unlimited),
            _ => Err(anyhow::anyhow!("Invalid expiration: {}", s)),
        }
    }
}

/// Staff-side view partition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Freshly declared reports (`Declared by client` only)
    Reports,
    /// Tracked items (everything except `Declared by client`)
    Items,
}

/// A lost item as stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LostItem {
    pub storage_id: Uuid,
    /// Client-visible identifier; the key every operation uses
    pub id: String,
    pub title: String,
    pub description: String,
    pub place_last_seen: String,
    pub date_last_seen: NaiveDate,
    pub image: Option<String>,
    pub status: ItemStatus,
    pub expiration: Expiration,
    pub email: Option<String>,
    pub client_email: Option<String>,
    pub client_id: Option<String>,
    pub pickup_requested: bool,
    pub pickup_requested_at: Option<DateTime<Utc>>,
    pub delivery_requested: bool,
    pub delivery_requested_at: Option<DateTime<Utc>>,
    pub delivery_address: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_postal_code: Option<String>,
    pub delivery_phone: Option<String>,
    pub delivery_reference: Option<Uuid>,
    pub delivery_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for LostItem {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(LostItem {
            storage_id: row.try_get("storage_id")?,
            id: row.try_get("public_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            place_last_seen: row.try_get("place_last_seen")?,
            date_last_seen: row.try_get("date_last_seen")?,
            image: row.try_get("image")?,
            status: row.try_get::<String, _>("status")?.parse().map_err(|e| {
                sqlx::Error::Decode(format!("Failed to parse status: {}", e).into())
            })?,
            expiration: row
                .try_get::<String, _>("expiration")?
                .parse()
                .map_err(|e: anyhow::Error| sqlx::Error::Decode(e.into()))?,
            email: row.try_get("email")?,
            client_email: row.try_get("client_email")?,
            client_id: row.try_get("client_id")?,
            pickup_requested: row.try_get("pickup_requested")?,
            pickup_requested_at: row.try_get("pickup_requested_at")?,
            delivery_requested: row.try_get("delivery_requested")?,
            delivery_requested_at: row.try_get("delivery_requested_at")?,
            delivery_address: row.try_get("delivery_address")?,
            delivery_city: row.try_get("delivery_city")?,
            delivery_postal_code: row.try_get("delivery_postal_code")?,
            delivery_phone: row.try_get("delivery_phone")?,
            delivery_reference: row.try_get("delivery_reference")?,
            delivery_paid: row.try_get("delivery_paid")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl LostItem {
    /// The reporting guest's id, if the item carries a usable one.
    pub fn client_reference(&self) -> Option<&str> {
        self.client_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Values for a new row, after the lifecycle rules have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLostItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub place_last_seen: String,
    pub date_last_seen: NaiveDate,
    pub image: Option<String>,
    pub status: ItemStatus,
    pub expiration: Expiration,
    pub email: Option<String>,
    pub client_email: Option<String>,
    pub client_id: Option<String>,
}

/// Delivery details written together with the `Delivery requested` transition.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryDetails {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
    pub reference: Uuid,
    pub requested_at: DateTime<Utc>,
}

/// Partial update. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub place_last_seen: Option<String>,
    pub date_last_seen: Option<NaiveDate>,
    /// `Some(None)` clears the image
    pub image: Option<Option<String>>,
    pub expiration: Option<Expiration>,
    pub status: Option<ItemStatus>,
    pub pickup_requested_at: Option<DateTime<Utc>>,
    pub delivery: Option<DeliveryDetails>,
}

impl ItemChanges {
    pub fn status(status: ItemStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &ItemChanges::default()
    }

    /// Applies the changes to an in-memory copy, mirroring the SQL update.
    pub fn apply_to(&self, item: &mut LostItem, now: DateTime<Utc>) {
        if let Some(ref title) = self.title {
            item.title = title.clone();
        }
        if let Some(ref description) = self.description {
            item.description = description.clone();
        }
        if let Some(ref place) = self.place_last_seen {
            item.place_last_seen = place.clone();
        }
        if let Some(date) = self.date_last_seen {
            item.date_last_seen = date;
        }
        if let Some(ref image) = self.image {
            item.image = image.clone();
        }
        if let Some(expiration) = self.expiration {
            item.expiration = expiration;
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(at) = self.pickup_requested_at {
            item.pickup_requested = true;
            item.pickup_requested_at = Some(at);
        }
        if let Some(ref delivery) = self.delivery {
            item.delivery_requested = true;
            item.delivery_requested_at = Some(delivery.requested_at);
            item.delivery_address = Some(delivery.address.clone());
            item.delivery_city = Some(delivery.city.clone());
            item.delivery_postal_code = Some(delivery.postal_code.clone());
            item.delivery_phone = Some(delivery.phone.clone());
            item.delivery_reference = Some(delivery.reference);
        }
        item.updated_at = now;
    }
}

/// Request DTO for reporting an item
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateItemRequest {
    /// Public identifier chosen by the reporter; generated when omitted
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "id must be between 1 and 64 characters"))]
    pub id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255, message = "title must be at most 255 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "place_last_seen must be at most 255 characters"))]
    pub place_last_seen: String,
    pub date_last_seen: NaiveDate,
    #[serde(default)]
    pub image: Option<String>,
    /// Ignored for guests; staff may pick from the staff-allowed set
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expiration: Option<Expiration>,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
}

/// Request DTO for a staff edit
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateItemRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be between 1 and 255 characters"))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "place_last_seen must be between 1 and 255 characters"))]
    pub place_last_seen: Option<String>,
    #[serde(default)]
    pub date_last_seen: Option<NaiveDate>,
    /// `null` removes the image, absent leaves it
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image: Option<Option<String>>,
    #[serde(default)]
    pub expiration: Option<Expiration>,
    #[serde(default)]
    pub status: Option<String>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Request DTO for a status change
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct SetStatusRequest {
    /// One of the item status labels
    pub status: String,
}

/// Address set for a home delivery. Blank fields are reported together as
/// `MissingFields`, so there are no per-field rules here.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct DeliveryAddress {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub phone: String,
}

impl DeliveryAddress {
    /// Names of the fields that are blank, in form order.
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("address", &self.address),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("phone", &self.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

/// Returned by a delivery request; the reference feeds the payment step
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeliveryTicket {
    pub item_id: String,
    pub delivery_reference: Uuid,
    pub amount_cents: i64,
    pub currency: String,
}

/// Query parameters for listing items
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListItemsQuery {
    /// `reports` or `items`
    pub section: Option<Section>,
    /// Case-insensitive text matched against title, description and place
    pub q: Option<String>,
    /// Exact `date_last_seen` (YYYY-MM-DD)
    pub date: Option<NaiveDate>,
}

/// Item response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub place_last_seen: String,
    pub date_last_seen: NaiveDate,
    pub image: Option<String>,
    pub status: ItemStatus,
    pub expiration: Expiration,
    pub email: Option<String>,
    pub client_email: Option<String>,
    pub client_id: Option<String>,
    pub pickup_requested: bool,
    pub pickup_requested_at: Option<DateTime<Utc>>,
    pub delivery_requested: bool,
    pub delivery_requested_at: Option<DateTime<Utc>>,
    pub delivery_address: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_postal_code: Option<String>,
    pub delivery_phone: Option<String>,
    /// Feeds the payment step; only owners and staff can read an item
    pub delivery_reference: Option<Uuid>,
    pub delivery_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LostItem> for ItemResponse {
    fn from(item: LostItem) -> Self {
        ItemResponse {
            id: item.id,
            title: item.title,
            description: item.description,
            place_last_seen: item.place_last_seen,
            date_last_seen: item.date_last_seen,
            image: item.image,
            status: item.status,
            expiration: item.expiration,
            email: item.email,
            client_email: item.client_email,
            client_id: item.client_id,
            pickup_requested: item.pickup_requested,
            pickup_requested_at: item.pickup_requested_at,
            delivery_requested: item.delivery_requested,
            delivery_requested_at: item.delivery_requested_at,
            delivery_address: item.delivery_address,
            delivery_city: item.delivery_city,
            delivery_postal_code: item.delivery_postal_code,
            delivery_phone: item.delivery_phone,
            delivery_reference: item.delivery_reference,
            delivery_paid: item.delivery_paid,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// Count of items in one status
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct StatusCount {
    pub status: ItemStatus,
    pub count: usize,
}

/// Staff dashboard figures
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_items: usize,
    pub found_items: usize,
    pub delivered_items: usize,
    /// Declared or found, i.e. not yet handed back
    pub pending_items: usize,
    pub status_breakdown: Vec<StatusCount>,
    pub recent_activity: Vec<ItemResponse>,
}
