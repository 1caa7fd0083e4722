//! Lost item and client repositories against a real Postgres.
//!
//! Run with: `cargo test -p lostfound-db --test item_repository_test`
//! Requires Docker for testcontainers (Postgres).

mod helpers;

use chrono::Utc;
use helpers::{date, new_item, setup_test_db};
use lostfound_core::models::{
    DeliveryDetails, Expiration, ItemChanges, ItemStatus, Section, SessionContext,
};
use lostfound_core::{AppError, ItemScope};
use lostfound_db::{ClientDirectory, ClientRepository, LostItemRepository};
use uuid::Uuid;

fn staff() -> SessionContext {
    SessionContext::staff("emp-1", "desk@hotel.example")
}

fn ids(items: &[lostfound_core::models::LostItem]) -> Vec<String> {
    let mut ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_insert_then_fetch_by_public_id() {
    let Some(db) = setup_test_db().await else { return };
    let repo = LostItemRepository::new(db.pool.clone());

    let mut item = new_item("ITEM-1", ItemStatus::DeclaredByClient, Some("c1"));
    item.image = Some("https://cdn.hotel.example/wallet.jpg".to_string());
    item.expiration = Expiration::OneYear;
    item.email = Some("ada@mail.example".to_string());

    let created = repo.insert(item.clone()).await.unwrap();
    assert_eq!(created.id, "ITEM-1");
    assert!(!created.pickup_requested);
    assert!(!created.delivery_requested);
    assert!(!created.delivery_paid);
    assert_eq!(created.delivery_reference, None);

    let fetched = repo.find_by_public_id("ITEM-1").await.unwrap().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.title, item.title);
    assert_eq!(fetched.date_last_seen, item.date_last_seen);
    assert_eq!(fetched.image, item.image);
    assert_eq!(fetched.status, ItemStatus::DeclaredByClient);
    assert_eq!(fetched.expiration, Expiration::OneYear);
    assert_eq!(fetched.email.as_deref(), Some("ada@mail.example"));
    assert_eq!(fetched.client_email.as_deref(), Some("c1@guests.example"));
    assert_eq!(fetched.client_id.as_deref(), Some("c1"));

    let by_storage = repo.find_by_id(created.storage_id).await.unwrap().unwrap();
    assert_eq!(by_storage.id, "ITEM-1");
    assert!(repo.find_by_public_id("ITEM-404").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_public_id_is_a_conflict() {
    let Some(db) = setup_test_db().await else { return };
    let repo = LostItemRepository::new(db.pool.clone());

    repo.insert(new_item("ITEM-1", ItemStatus::FoundByStaff, None))
        .await
        .unwrap();
    let err = repo
        .insert(new_item("ITEM-1", ItemStatus::DeclaredByClient, Some("c1")))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(ref msg) if msg.contains("ITEM-1")));
    let kept = repo.find_by_public_id("ITEM-1").await.unwrap().unwrap();
    assert_eq!(kept.status, ItemStatus::FoundByStaff);
}

#[tokio::test]
async fn test_status_column_only_holds_known_labels() {
    let Some(db) = setup_test_db().await else { return };
    let repo = LostItemRepository::new(db.pool.clone());
    repo.insert(new_item("ITEM-1", ItemStatus::FoundByStaff, None))
        .await
        .unwrap();

    let err = sqlx::query("UPDATE lost_items SET status = 'Lost' WHERE public_id = 'ITEM-1'")
        .execute(&db.pool)
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.code().as_deref(), Some("23514"));
}

#[tokio::test]
async fn test_list_scopes_follow_sections_and_ownership() {
    let Some(db) = setup_test_db().await else { return };
    let repo = LostItemRepository::new(db.pool.clone());

    for item in [
        new_item("A", ItemStatus::DeclaredByClient, Some("c1")),
        new_item("B", ItemStatus::FoundByStaff, Some("c1")),
        new_item("C", ItemStatus::DeclaredByClient, Some("c2")),
        new_item("D", ItemStatus::Delivered, None),
    ] {
        repo.insert(item).await.unwrap();
    }

    let everything = repo
        .list(&ItemScope::for_session(&staff(), None, None, None))
        .await
        .unwrap();
    assert_eq!(ids(&everything), vec!["A", "B", "C", "D"]);

    let reports = repo
        .list(&ItemScope::for_session(&staff(), Some(Section::Reports), None, None))
        .await
        .unwrap();
    assert_eq!(ids(&reports), vec!["A", "C"]);

    let tracked = repo
        .list(&ItemScope::for_session(&staff(), Some(Section::Items), None, None))
        .await
        .unwrap();
    assert_eq!(ids(&tracked), vec!["B", "D"]);

    let own = repo
        .list(&ItemScope::for_session(
            &SessionContext::client("c1", "c1@guests.example"),
            None,
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(ids(&own), vec!["A", "B"]);

    let mut no_id = SessionContext::client("c1", "c1@guests.example");
    no_id.client_id = None;
    let nothing = repo
        .list(&ItemScope::for_session(&no_id, None, None, None))
        .await
        .unwrap();
    assert!(nothing.is_empty());
}

#[tokio::test]
async fn test_list_text_search_is_literal_and_case_insensitive() {
    let Some(db) = setup_test_db().await else { return };
    let repo = LostItemRepository::new(db.pool.clone());

    let mut coupon = new_item("COUPON", ItemStatus::FoundByStaff, None);
    coupon.title = "Spa voucher 50% off".to_string();
    let mut plain = new_item("PLAIN", ItemStatus::FoundByStaff, None);
    plain.title = "Spa voucher 500 off".to_string();
    let mut scarf = new_item("SCARF", ItemStatus::FoundByStaff, None);
    scarf.title = "Scarf".to_string();
    scarf.place_last_seen = "Rooftop_Bar".to_string();
    scarf.date_last_seen = date(9);
    for item in [coupon, plain, scarf] {
        repo.insert(item).await.unwrap();
    }

    let search = |text: &'static str| {
        let repo = repo.clone();
        async move {
            repo.list(&ItemScope::for_session(&staff(), None, Some(text), None))
                .await
                .unwrap()
        }
    };

    assert_eq!(ids(&search("50%").await), vec!["COUPON"]);
    assert_eq!(ids(&search("SPA VOUCHER").await), vec!["COUPON", "PLAIN"]);
    assert!(search("spa_voucher").await.is_empty());
    assert_eq!(ids(&search("top_bar").await), vec!["SCARF"]);
    assert_eq!(ids(&search("leather").await).len(), 3);

    let on_day = repo
        .list(&ItemScope::for_session(&staff(), None, None, Some(date(9))))
        .await
        .unwrap();
    assert_eq!(ids(&on_day), vec!["SCARF"]);
}

#[tokio::test]
async fn test_update_fields_writes_only_given_columns() {
    let Some(db) = setup_test_db().await else { return };
    let repo = LostItemRepository::new(db.pool.clone());

    let mut item = new_item("ITEM-1", ItemStatus::FoundByStaff, Some("c1"));
    item.image = Some("https://cdn.hotel.example/wallet.jpg".to_string());
    let created = repo.insert(item).await.unwrap();

    let updated = repo
        .update_fields(
            "ITEM-1",
            ItemChanges {
                title: Some("Black wallet".to_string()),
                image: Some(None),
                expiration: Some(Expiration::OneMonth),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Black wallet");
    assert_eq!(updated.image, None);
    assert_eq!(updated.expiration, Expiration::OneMonth);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.status, ItemStatus::FoundByStaff);
    assert!(updated.updated_at >= created.updated_at);

    let picked = repo
        .update_fields(
            "ITEM-1",
            ItemChanges {
                status: Some(ItemStatus::PickupRequested),
                pickup_requested_at: Some(Utc::now()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(picked.status, ItemStatus::PickupRequested);
    assert!(picked.pickup_requested);
    assert!(picked.pickup_requested_at.is_some());
    assert_eq!(picked.title, "Black wallet");

    assert!(repo
        .update_fields("ITEM-404", ItemChanges::status(ItemStatus::Delivered))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_delivery_details_are_stored_and_found_by_reference() {
    let Some(db) = setup_test_db().await else { return };
    let repo = LostItemRepository::new(db.pool.clone());
    repo.insert(new_item("ITEM-1", ItemStatus::FoundByStaff, Some("c1")))
        .await
        .unwrap();

    let reference = Uuid::new_v4();
    let updated = repo
        .update_fields(
            "ITEM-1",
            ItemChanges {
                status: Some(ItemStatus::DeliveryRequested),
                delivery: Some(DeliveryDetails {
                    address: "12 Harbour Road".to_string(),
                    city: "Lisbon".to_string(),
                    postal_code: "1100-001".to_string(),
                    phone: "+351 555 0100".to_string(),
                    reference,
                    requested_at: Utc::now(),
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert!(updated.delivery_requested);
    assert_eq!(updated.delivery_city.as_deref(), Some("Lisbon"));
    assert_eq!(updated.delivery_reference, Some(reference));

    let found = repo
        .find_by_delivery_reference(reference)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, "ITEM-1");
    assert!(repo
        .find_by_delivery_reference(Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_delete_reports_whether_a_row_went() {
    let Some(db) = setup_test_db().await else { return };
    let repo = LostItemRepository::new(db.pool.clone());
    repo.insert(new_item("ITEM-1", ItemStatus::FoundByStaff, None))
        .await
        .unwrap();

    assert!(repo.delete_by_public_id("ITEM-1").await.unwrap());
    assert!(!repo.delete_by_public_id("ITEM-1").await.unwrap());
    assert!(repo.find_by_public_id("ITEM-1").await.unwrap().is_none());
    repo.health_check().await.unwrap();
}

#[tokio::test]
async fn test_client_directory_upserts_and_resolves() {
    let Some(db) = setup_test_db().await else { return };
    let clients = ClientRepository::new(db.pool.clone());

    clients
        .upsert_client("c1", "Ada", "ada@old.example")
        .await
        .unwrap();
    let refreshed = clients
        .upsert_client("c1", "Ada Lovelace", "ada@guests.example")
        .await
        .unwrap();
    assert_eq!(refreshed.email, "ada@guests.example");
    assert_eq!(clients.list_clients().await.unwrap().len(), 1);

    let contact = clients.resolve_client_contact("c1").await.unwrap().unwrap();
    assert_eq!(contact.name, "Ada Lovelace");
    assert_eq!(contact.email, "ada@guests.example");
    assert!(clients.resolve_client_contact("c9").await.unwrap().is_none());
    assert!(clients.get_client("c9").await.unwrap().is_none());
}
