//! Test helpers: the real router over in-memory backends.
//!
//! No database or mail relay is needed: `cargo test -p lostfound-api`.

#![allow(dead_code)]

use axum_test::TestServer;
use lostfound_api::auth::JwtService;
use lostfound_api::constants;
use lostfound_api::setup::routes;
use lostfound_api::test_helpers::{test_config, TestBackends};
use lostfound_core::models::{LostItem, SessionContext};
use lostfound_core::Config;

pub const STAFF_EMAIL: &str = "desk@hotel.example";

/// API path prefix for tests (e.g. `/api/v0/items`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub struct TestApp {
    pub server: TestServer,
    pub backends: TestBackends,
    jwt: JwtService,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn staff_token(&self) -> String {
        self.jwt
            .issue(&SessionContext::staff("emp-1", STAFF_EMAIL))
            .expect("staff token")
    }

    pub fn client_token(&self, client_id: &str) -> String {
        self.jwt
            .issue(&SessionContext::client(
                client_id,
                format!("{}@guests.example", client_id),
            ))
            .expect("client token")
    }

    pub fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(Vec::new())
}

pub fn setup_test_app_with(items: Vec<LostItem>) -> TestApp {
    let config: Config = test_config();
    let backends = TestBackends::with_items(items);
    let state = backends.state(config.clone());
    let router = routes::setup_routes(&config, state).expect("router");
    let server = TestServer::new(router).expect("test server");

    TestApp {
        server,
        backends,
        jwt: JwtService::from_config(&config),
    }
}
