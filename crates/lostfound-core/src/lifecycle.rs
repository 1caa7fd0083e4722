//! Lifecycle rules for lost items.
//!
//! Everything here is pure: which status a new report gets, who sees which
//! items, when a transition is allowed and when it must notify someone. The
//! service layer applies these rules around the store.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    DashboardStats, ItemEvent, ItemResponse, ItemStatus, LostItem, Role, Section, SessionContext,
    StatusCount,
};

/// Statuses staff may pick when filing a report themselves.
pub const STAFF_CREATABLE_STATUSES: [ItemStatus; 2] =
    [ItemStatus::FoundByStaff, ItemStatus::DeclaredByClient];

const RECENT_ACTIVITY_LIMIT: usize = 10;

/// Resolves the status of a new report.
///
/// Guests always file `Declared by client`, whatever they sent. Staff default
/// to `Found by staff` and may only override with a staff-creatable status.
pub fn creation_status(role: Role, requested: Option<&str>) -> Result<ItemStatus, AppError> {
    match role {
        Role::Client => Ok(ItemStatus::DeclaredByClient),
        Role::Staff => {
            let Some(raw) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
                return Ok(ItemStatus::FoundByStaff);
            };
            let status: ItemStatus = raw.parse()?;
            if STAFF_CREATABLE_STATUSES.contains(&status) {
                Ok(status)
            } else {
                Err(AppError::InvalidStatus(format!(
                    "{} (new reports may only be '{}' or '{}')",
                    raw,
                    ItemStatus::FoundByStaff,
                    ItemStatus::DeclaredByClient
                )))
            }
        }
    }
}

/// New public identifier, e.g. `ITEM-3FA85F64`.
pub fn generate_public_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("ITEM-{}", hex[..8].to_uppercase())
}

/// The event a status change must raise, if any.
///
/// Only `Found by staff` on a guest-reported item notifies, and it does so
/// on every such write.
pub fn status_change_event(item: &LostItem, new_status: ItemStatus) -> Option<ItemEvent> {
    if new_status != ItemStatus::FoundByStaff {
        return None;
    }
    item.client_reference().map(|client_id| ItemEvent::ItemFound {
        item_id: item.id.clone(),
        title: item.title.clone(),
        client_id: client_id.to_string(),
    })
}

/// Fails unless the item currently sits in `expected`.
pub fn ensure_status(item: &LostItem, expected: ItemStatus) -> Result<(), AppError> {
    if item.status == expected {
        Ok(())
    } else {
        Err(AppError::InvalidTransition(format!(
            "Item {} is '{}', expected '{}'",
            item.id, item.status, expected
        )))
    }
}

pub fn ensure_staff(session: &SessionContext, action: &str) -> Result<(), AppError> {
    if session.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Only staff can {}", action)))
    }
}

/// Which statuses a listing includes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(ItemStatus),
    Except(ItemStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: ItemStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(s) => status == *s,
            StatusFilter::Except(s) => status != *s,
        }
    }
}

impl From<Option<Section>> for StatusFilter {
    fn from(section: Option<Section>) -> Self {
        match section {
            None => StatusFilter::All,
            Some(Section::Reports) => StatusFilter::Only(ItemStatus::DeclaredByClient),
            Some(Section::Items) => StatusFilter::Except(ItemStatus::DeclaredByClient),
        }
    }
}

/// A resolved listing: what the store must return for one caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemScope {
    pub statuses: StatusFilter,
    /// When set, only items reported by this client
    pub client_id: Option<String>,
    /// Lower-cased search text
    pub text: Option<String>,
    pub date: Option<NaiveDate>,
}

impl ItemScope {
    /// Builds the scope a session may see.
    ///
    /// Clients are always restricted to their own reports; a client session
    /// without an id sees nothing rather than everything.
    pub fn for_session(
        session: &SessionContext,
        section: Option<Section>,
        text: Option<&str>,
        date: Option<NaiveDate>,
    ) -> Self {
        let client_id = match session.role {
            Role::Staff => None,
            Role::Client => Some(session.client_id.clone().unwrap_or_default()),
        };
        ItemScope {
            statuses: section.into(),
            client_id,
            text: text
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty()),
            date,
        }
    }

    /// In-memory equivalent of the SQL filter.
    pub fn matches(&self, item: &LostItem) -> bool {
        if !self.statuses.matches(item.status) {
            return false;
        }
        if let Some(ref client_id) = self.client_id {
            if item.client_id.as_ref() != Some(client_id) {
                return false;
            }
        }
        if let Some(date) = self.date {
            if item.date_last_seen != date {
                return false;
            }
        }
        if let Some(ref text) = self.text {
            let hit = [&item.title, &item.description, &item.place_last_seen]
                .iter()
                .any(|field| field.to_lowercase().contains(text.as_str()));
            if !hit {
                return false;
            }
        }
        true
    }
}

/// Staff dashboard figures over a set of items.
pub fn dashboard_stats(items: &[LostItem]) -> DashboardStats {
    let count = |status: ItemStatus| items.iter().filter(|i| i.status == status).count();

    let status_breakdown = ItemStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: count(status),
        })
        .collect();

    let mut recent: Vec<&LostItem> = items.iter().collect();
    recent.sort_by(|a, b| {
        b.date_last_seen
            .cmp(&a.date_last_seen)
            .then(b.created_at.cmp(&a.created_at))
    });
    let recent_activity = recent
        .into_iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .cloned()
        .map(ItemResponse::from)
        .collect();

    DashboardStats {
        total_items: items.len(),
        found_items: count(ItemStatus::FoundByStaff),
        delivered_items: count(ItemStatus::Delivered),
        pending_items: count(ItemStatus::DeclaredByClient) + count(ItemStatus::FoundByStaff),
        status_breakdown,
        recent_activity,
    }
}

/// Builds an item as the store would return it. Test and fixture helper.
pub fn sample_item(id: &str, status: ItemStatus, client_id: Option<&str>) -> LostItem {
    let now = Utc::now();
    LostItem {
        storage_id: Uuid::new_v4(),
        id: id.to_string(),
        title: "Wallet".to_string(),
        description: "Brown leather wallet".to_string(),
        place_last_seen: "Lobby".to_string(),
        date_last_seen: now.date_naive(),
        image: None,
        status,
        expiration: Default::default(),
        email: None,
        client_email: client_id.map(|c| format!("{}@guests.example", c)),
        client_id: client_id.map(str::to_string),
        pickup_requested: false,
        pickup_requested_at: None,
        delivery_requested: false,
        delivery_requested_at: None,
        delivery_address: None,
        delivery_city: None,
        delivery_postal_code: None,
        delivery_phone: None,
        delivery_reference: None,
        delivery_paid: false,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff() -> SessionContext {
        SessionContext::staff("s1", "desk@hotel.example")
    }

    fn client(id: &str) -> SessionContext {
        SessionContext::client(id, format!("{}@guests.example", id))
    }

    fn catalogue() -> Vec<LostItem> {
        vec![
            sample_item("A", ItemStatus::DeclaredByClient, Some("c1")),
            sample_item("B", ItemStatus::DeclaredByClient, Some("c2")),
            sample_item("C", ItemStatus::FoundByStaff, None),
            sample_item("D", ItemStatus::FoundByStaff, Some("c1")),
            sample_item("E", ItemStatus::PickupRequested, Some("c2")),
            sample_item("F", ItemStatus::DeliveryRequested, Some("c1")),
            sample_item("G", ItemStatus::Delivered, None),
        ]
    }

    fn ids(scope: &ItemScope, items: &[LostItem]) -> Vec<String> {
        items
            .iter()
            .filter(|i| scope.matches(i))
            .map(|i| i.id.clone())
            .collect()
    }

    #[test]
    fn test_client_creation_always_declared() {
        for requested in [None, Some("Found by staff"), Some("Delivered"), Some("bogus")] {
            assert_eq!(
                creation_status(Role::Client, requested).unwrap(),
                ItemStatus::DeclaredByClient
            );
        }
    }

    #[test]
    fn test_staff_creation_defaults_to_found() {
        assert_eq!(
            creation_status(Role::Staff, None).unwrap(),
            ItemStatus::FoundByStaff
        );
        assert_eq!(
            creation_status(Role::Staff, Some("  ")).unwrap(),
            ItemStatus::FoundByStaff
        );
        assert_eq!(
            creation_status(Role::Staff, Some("Declared by client")).unwrap(),
            ItemStatus::DeclaredByClient
        );
    }

    #[test]
    fn test_staff_creation_outside_allowed_set_rejected() {
        assert!(matches!(
            creation_status(Role::Staff, Some("Delivered")),
            Err(AppError::InvalidStatus(_))
        ));
        assert!(matches!(
            creation_status(Role::Staff, Some("Found")),
            Err(AppError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_generated_ids_are_prefixed_and_distinct() {
        let a = generate_public_id();
        let b = generate_public_id();
        assert!(a.starts_with("ITEM-"));
        assert_eq!(a.len(), 13);
        assert_ne!(a, b);
    }

    #[test]
    fn test_found_on_client_item_raises_event() {
        let item = sample_item("ITEM-X", ItemStatus::DeclaredByClient, Some("c1"));
        let event = status_change_event(&item, ItemStatus::FoundByStaff).unwrap();
        assert_eq!(
            event,
            ItemEvent::ItemFound {
                item_id: "ITEM-X".to_string(),
                title: "Wallet".to_string(),
                client_id: "c1".to_string(),
            }
        );
    }

    #[test]
    fn test_no_event_without_client_or_for_other_statuses() {
        let staff_item = sample_item("S", ItemStatus::DeclaredByClient, None);
        assert!(status_change_event(&staff_item, ItemStatus::FoundByStaff).is_none());

        let blank_client = sample_item("B", ItemStatus::DeclaredByClient, Some("  "));
        assert!(status_change_event(&blank_client, ItemStatus::FoundByStaff).is_none());

        let client_item = sample_item("C", ItemStatus::FoundByStaff, Some("c1"));
        for status in ItemStatus::ALL {
            if status != ItemStatus::FoundByStaff {
                assert!(status_change_event(&client_item, status).is_none());
            }
        }
    }

    #[test]
    fn test_staff_reports_are_exactly_declared_items() {
        let items = catalogue();
        let scope = ItemScope::for_session(&staff(), Some(Section::Reports), None, None);
        assert_eq!(ids(&scope, &items), vec!["A", "B"]);
    }

    #[test]
    fn test_staff_items_are_exactly_the_complement() {
        let items = catalogue();
        let reports = ItemScope::for_session(&staff(), Some(Section::Reports), None, None);
        let tracked = ItemScope::for_session(&staff(), Some(Section::Items), None, None);
        let tracked_ids = ids(&tracked, &items);
        assert_eq!(tracked_ids, vec!["C", "D", "E", "F", "G"]);

        for item in &items {
            assert_ne!(reports.matches(item), tracked.matches(item));
        }
    }

    #[test]
    fn test_client_sees_only_own_items() {
        let items = catalogue();
        let scope = ItemScope::for_session(&client("c1"), None, None, None);
        assert_eq!(ids(&scope, &items), vec!["A", "D", "F"]);

        let reports = ItemScope::for_session(&client("c1"), Some(Section::Reports), None, None);
        assert_eq!(ids(&reports, &items), vec!["A"]);
    }

    #[test]
    fn test_client_session_without_id_sees_nothing() {
        let mut session = client("c1");
        session.client_id = None;
        let scope = ItemScope::for_session(&session, None, None, None);
        assert!(ids(&scope, &catalogue()).is_empty());
    }

    #[test]
    fn test_text_and_date_filters() {
        let mut items = catalogue();
        items[2].title = "Blue Umbrella".to_string();
        items[3].place_last_seen = "Pool bar".to_string();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        items[3].date_last_seen = day;

        let by_text = ItemScope::for_session(&staff(), None, Some("UMBRELLA"), None);
        assert_eq!(ids(&by_text, &items), vec!["C"]);

        let by_place = ItemScope::for_session(&staff(), None, Some("pool"), None);
        assert_eq!(ids(&by_place, &items), vec!["D"]);

        let by_date = ItemScope::for_session(&staff(), None, None, Some(day));
        assert_eq!(ids(&by_date, &items), vec!["D"]);

        let blank = ItemScope::for_session(&staff(), None, Some("   "), None);
        assert_eq!(blank.text, None);
    }

    #[test]
    fn test_ensure_status() {
        let item = sample_item("X", ItemStatus::DeclaredByClient, Some("c1"));
        assert!(ensure_status(&item, ItemStatus::DeclaredByClient).is_ok());
        assert!(matches!(
            ensure_status(&item, ItemStatus::FoundByStaff),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_dashboard_stats() {
        let stats = dashboard_stats(&catalogue());
        assert_eq!(stats.total_items, 7);
        assert_eq!(stats.found_items, 2);
        assert_eq!(stats.delivered_items, 1);
        assert_eq!(stats.pending_items, 4);
        assert_eq!(stats.status_breakdown.len(), 5);
        assert_eq!(stats.recent_activity.len(), 7);
        let declared = &stats.status_breakdown[0];
        assert_eq!(declared.status, ItemStatus::DeclaredByClient);
        assert_eq!(declared.count, 2);
    }
}
