//! Item reporting, listing and status API tests.
//!
//! Run with: `cargo test -p lostfound-api --test items_test`

mod helpers;

use axum::http::StatusCode;
use helpers::{api_path, setup_test_app, setup_test_app_with, TestApp};
use lostfound_core::lifecycle::sample_item;
use lostfound_core::models::{ItemEvent, ItemStatus};
use serde_json::{json, Value};

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let app = setup_test_app();

    let response = app.client().get(&api_path("/items")).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");

    let response = app
        .client()
        .get(&api_path("/items"))
        .add_header("Authorization", "Bearer not-a-jwt")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_endpoints_are_public() {
    let app = setup_test_app();
    app.client().get("/live").await.assert_status_ok();

    let response = app.client().get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["database"], "healthy");
}

#[tokio::test]
async fn test_me_echoes_the_session() {
    let app = setup_test_app();
    let response = app
        .client()
        .get(&api_path("/me"))
        .add_header("Authorization", TestApp::bearer(&app.client_token("c1")))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["role"], "client");
    assert_eq!(body["client_id"], "c1");
}

#[tokio::test]
async fn test_client_report_ignores_requested_status() {
    let app = setup_test_app();

    let response = app
        .client()
        .post(&api_path("/items"))
        .add_header("Authorization", TestApp::bearer(&app.client_token("c1")))
        .json(&json!({
            "title": "Umbrella",
            "description": "Black, wooden handle",
            "place_last_seen": "Bar",
            "date_last_seen": "2024-05-02",
            "status": "Delivered"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["status"], "Declared by client");
    assert_eq!(body["client_id"], "c1");
    assert_eq!(body["expiration"], "unlimited");
}

#[tokio::test]
async fn test_report_with_blank_fields_lists_them() {
    let app = setup_test_app();

    let response = app
        .client()
        .post(&api_path("/items"))
        .add_header("Authorization", TestApp::bearer(&app.staff_token()))
        .json(&json!({
            "title": "",
            "place_last_seen": " ",
            "date_last_seen": "2024-05-02"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "MISSING_FIELDS");
    assert!(app.backends.store.snapshot().is_empty());
}

#[tokio::test]
async fn test_duplicate_id_conflicts() {
    let app = setup_test_app_with(vec![sample_item("ITEM-1", ItemStatus::FoundByStaff, None)]);

    let response = app
        .client()
        .post(&api_path("/items"))
        .add_header("Authorization", TestApp::bearer(&app.staff_token()))
        .json(&json!({
            "id": "ITEM-1",
            "title": "Keys",
            "place_last_seen": "Pool",
            "date_last_seen": "2024-05-02"
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_listing_sections_and_ownership() {
    let app = setup_test_app_with(vec![
        sample_item("ITEM-1", ItemStatus::DeclaredByClient, Some("c1")),
        sample_item("ITEM-2", ItemStatus::FoundByStaff, None),
        sample_item("ITEM-3", ItemStatus::PickupRequested, Some("c2")),
    ]);
    let staff = TestApp::bearer(&app.staff_token());

    let reports: Value = app
        .client()
        .get(&api_path("/items"))
        .add_query_param("section", "reports")
        .add_header("Authorization", staff.clone())
        .await
        .json();
    assert_eq!(reports["count"], 1);
    assert_eq!(reports["items"][0]["id"], "ITEM-1");

    let tracked: Value = app
        .client()
        .get(&api_path("/items"))
        .add_query_param("section", "items")
        .add_header("Authorization", staff)
        .await
        .json();
    assert_eq!(tracked["count"], 2);

    let own: Value = app
        .client()
        .get(&api_path("/items"))
        .add_header("Authorization", TestApp::bearer(&app.client_token("c2")))
        .await
        .json();
    assert_eq!(own["count"], 1);
    assert_eq!(own["items"][0]["id"], "ITEM-3");
}

#[tokio::test]
async fn test_client_cannot_read_someone_elses_item() {
    let app = setup_test_app_with(vec![sample_item("ITEM-1", ItemStatus::FoundByStaff, Some("c1"))]);

    app.client()
        .get(&api_path("/items/ITEM-1"))
        .add_header("Authorization", TestApp::bearer(&app.client_token("c1")))
        .await
        .assert_status_ok();

    app.client()
        .get(&api_path("/items/ITEM-1"))
        .add_header("Authorization", TestApp::bearer(&app.client_token("c2")))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_set_status_accepts_labels_only() {
    let app = setup_test_app_with(vec![sample_item("ITEM-1", ItemStatus::DeclaredByClient, None)]);
    let staff = TestApp::bearer(&app.staff_token());

    let response = app
        .client()
        .put(&api_path("/items/ITEM-1/status"))
        .add_header("Authorization", staff.clone())
        .json(&json!({ "status": "Lost" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_STATUS");
    assert_eq!(
        app.backends.store.get("ITEM-1").unwrap().status,
        ItemStatus::DeclaredByClient
    );

    let response = app
        .client()
        .put(&api_path("/items/ITEM-1/status"))
        .add_header("Authorization", staff)
        .json(&json!({ "status": "Delivered" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "Delivered");
}

#[tokio::test]
async fn test_clients_cannot_change_status() {
    let app = setup_test_app_with(vec![sample_item("ITEM-1", ItemStatus::DeclaredByClient, Some("c1"))]);

    let response = app
        .client()
        .put(&api_path("/items/ITEM-1/status"))
        .add_header("Authorization", TestApp::bearer(&app.client_token("c1")))
        .json(&json!({ "status": "Found by staff" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert!(app.backends.publisher.events().is_empty());
}

#[tokio::test]
async fn test_marking_a_guest_report_found_raises_one_event() {
    let app = setup_test_app_with(vec![sample_item("ITEM-X", ItemStatus::DeclaredByClient, Some("c1"))]);

    app.client()
        .put(&api_path("/items/ITEM-X/status"))
        .add_header("Authorization", TestApp::bearer(&app.staff_token()))
        .json(&json!({ "status": "Found by staff" }))
        .await
        .assert_status_ok();

    assert_eq!(
        app.backends.publisher.events(),
        vec![ItemEvent::ItemFound {
            item_id: "ITEM-X".to_string(),
            title: "Wallet".to_string(),
            client_id: "c1".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_staff_edit_and_delete() {
    let app = setup_test_app_with(vec![sample_item("ITEM-1", ItemStatus::FoundByStaff, None)]);
    let staff = TestApp::bearer(&app.staff_token());

    let response = app
        .client()
        .patch(&api_path("/items/ITEM-1"))
        .add_header("Authorization", staff.clone())
        .json(&json!({ "title": "Red wallet", "expiration": "1 year" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["title"], "Red wallet");
    assert_eq!(body["expiration"], "1 year");

    app.client()
        .delete(&api_path("/items/ITEM-1"))
        .add_header("Authorization", staff.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.client()
        .delete(&api_path("/items/ITEM-1"))
        .add_header("Authorization", staff)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_stats_for_staff() {
    let app = setup_test_app_with(vec![
        sample_item("ITEM-1", ItemStatus::DeclaredByClient, Some("c1")),
        sample_item("ITEM-2", ItemStatus::Delivered, None),
    ]);

    let response = app
        .client()
        .get(&api_path("/items/stats"))
        .add_header("Authorization", TestApp::bearer(&app.staff_token()))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total_items"], 2);
    assert_eq!(body["delivered_items"], 1);
    assert_eq!(body["status_breakdown"].as_array().unwrap().len(), 5);

    app.client()
        .get(&api_path("/items/stats"))
        .add_header("Authorization", TestApp::bearer(&app.client_token("c1")))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_created_item_reads_back_unchanged() {
    let app = setup_test_app();
    let token = TestApp::bearer(&app.client_token("c1"));

    let response = app
        .client()
        .post(&api_path("/items"))
        .add_header("Authorization", token.clone())
        .json(&json!({
            "id": "ITEM-RT",
            "title": "Silk scarf",
            "description": "Green with gold trim",
            "place_last_seen": "Spa changing room",
            "date_last_seen": "2024-05-03",
            "image": "https://cdn.hotel.example/scarf.jpg",
            "expiration": "1 year",
            "email": "ada@mail.example"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();

    let response = app
        .client()
        .get(&api_path("/items/ITEM-RT"))
        .add_header("Authorization", token)
        .await;
    response.assert_status_ok();
    let fetched: Value = response.json();

    assert_eq!(fetched, created);
    assert_eq!(fetched["id"], "ITEM-RT");
    assert_eq!(fetched["title"], "Silk scarf");
    assert_eq!(fetched["description"], "Green with gold trim");
    assert_eq!(fetched["place_last_seen"], "Spa changing room");
    assert_eq!(fetched["date_last_seen"], "2024-05-03");
    assert_eq!(fetched["image"], "https://cdn.hotel.example/scarf.jpg");
    assert_eq!(fetched["expiration"], "1 year");
    assert_eq!(fetched["email"], "ada@mail.example");
    assert_eq!(fetched["client_id"], "c1");
    assert_eq!(fetched["client_email"], "c1@guests.example");
    assert_eq!(fetched["status"], "Declared by client");
    assert_eq!(fetched["pickup_requested"], false);
    assert_eq!(fetched["delivery_requested"], false);
    assert_eq!(fetched["delivery_paid"], false);
    assert!(fetched["delivery_reference"].is_null());
}

#[tokio::test]
async fn test_staff_report_reads_back_with_defaults() {
    let app = setup_test_app();
    let staff = TestApp::bearer(&app.staff_token());

    let created: Value = app
        .client()
        .post(&api_path("/items"))
        .add_header("Authorization", staff.clone())
        .json(&json!({
            "id": "ITEM-DESK",
            "title": "Reading glasses",
            "place_last_seen": "Library",
            "date_last_seen": "2024-05-04"
        }))
        .await
        .json();

    let fetched: Value = app
        .client()
        .get(&api_path("/items/ITEM-DESK"))
        .add_header("Authorization", staff)
        .await
        .json();

    assert_eq!(fetched, created);
    assert_eq!(fetched["status"], "Found by staff");
    assert_eq!(fetched["expiration"], "unlimited");
    assert_eq!(fetched["description"], "");
    assert!(fetched["image"].is_null());
    assert!(fetched["email"].is_null());
    assert!(fetched["client_id"].is_null());
    assert!(fetched["client_email"].is_null());
}

#[tokio::test]
async fn test_inline_image_above_default_json_limit_is_accepted() {
    let app = setup_test_app();

    // 4 MiB of base64 decodes to a 3 MiB image, under the 10 MiB default.
    let image = format!("data:image/png;base64,{}", "A".repeat(4 * 1024 * 1024));
    let response = app
        .client()
        .post(&api_path("/items"))
        .add_header("Authorization", TestApp::bearer(&app.staff_token()))
        .json(&json!({
            "id": "ITEM-PHOTO",
            "title": "Camera",
            "place_last_seen": "Terrace",
            "date_last_seen": "2024-05-02",
            "image": image
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let stored = app.backends.store.get("ITEM-PHOTO").unwrap();
    assert_eq!(stored.image.map(|i| i.len()), Some(image.len()));
}

#[tokio::test]
async fn test_body_over_configured_limit_is_413() {
    let app = setup_test_app();

    let image = format!("data:image/png;base64,{}", "A".repeat(15 * 1024 * 1024));
    let response = app
        .client()
        .post(&api_path("/items"))
        .add_header("Authorization", TestApp::bearer(&app.staff_token()))
        .json(&json!({
            "title": "Camera",
            "place_last_seen": "Terrace",
            "date_last_seen": "2024-05-02",
            "image": image
        }))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.backends.store.snapshot().is_empty());
}
