//! From a status change over HTTP to the mail a guest receives.
//!
//! Run with: `cargo test -p lostfound-api --test notification_test`

mod helpers;

use helpers::{api_path, setup_test_app_with, TestApp};
use lostfound_api::test_helpers::{task_for, InMemoryClientDirectory, RecordingMailer};
use lostfound_api::services::Mailer;
use lostfound_api::{NotificationTaskHandler, TaskHandler};
use lostfound_core::lifecycle::sample_item;
use lostfound_core::models::ItemStatus;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_guest_is_mailed_when_their_report_is_found() {
    let app = setup_test_app_with(vec![sample_item("ITEM-X", ItemStatus::DeclaredByClient, Some("c1"))]);

    app.client()
        .put(&api_path("/items/ITEM-X/status"))
        .add_header("Authorization", TestApp::bearer(&app.staff_token()))
        .json(&json!({ "status": "Found by staff" }))
        .await
        .assert_status_ok();

    let events = app.backends.publisher.events();
    assert_eq!(events.len(), 1);

    let mailer = Arc::new(RecordingMailer::default());
    let handler = NotificationTaskHandler::new(
        Arc::new(InMemoryClientDirectory::default().with_client("c1", "Ada", "ada@guests.example")),
        Some(mailer.clone() as Arc<dyn Mailer>),
        "https://lostfound.example",
        Some(helpers::STAFF_EMAIL.to_string()),
    );

    let result = handler.process(&task_for(&events[0])).await.expect("mail sent");
    assert_eq!(result["sent_to"], "ada@guests.example");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ada@guests.example");
    assert_eq!(sent[0].subject, "We found your item: Wallet");
    assert!(sent[0].body.contains("https://lostfound.example/items/ITEM-X/pickup"));
}

#[tokio::test]
async fn test_staff_is_mailed_on_pickup_request() {
    let app = setup_test_app_with(vec![sample_item("ITEM-1", ItemStatus::FoundByStaff, Some("c1"))]);

    app.client()
        .post(&api_path("/items/ITEM-1/pickup"))
        .add_header("Authorization", TestApp::bearer(&app.client_token("c1")))
        .await
        .assert_status_ok();

    let events = app.backends.publisher.events();
    let mailer = Arc::new(RecordingMailer::default());
    let handler = NotificationTaskHandler::new(
        Arc::new(InMemoryClientDirectory::default()),
        Some(mailer.clone() as Arc<dyn Mailer>),
        "https://lostfound.example",
        Some(helpers::STAFF_EMAIL.to_string()),
    );

    handler.process(&task_for(&events[0])).await.expect("mail sent");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, helpers::STAFF_EMAIL);
    assert!(sent[0].subject.contains("ITEM-1"));
}

#[tokio::test]
async fn test_staff_found_item_without_owner_sends_nothing() {
    let app = setup_test_app_with(vec![sample_item("ITEM-2", ItemStatus::DeclaredByClient, None)]);

    app.client()
        .put(&api_path("/items/ITEM-2/status"))
        .add_header("Authorization", TestApp::bearer(&app.staff_token()))
        .json(&json!({ "status": "Found by staff" }))
        .await
        .assert_status_ok();

    assert!(app.backends.publisher.events().is_empty());
}
