//! Shared integration-test server bootstrap helpers.

use axum::http::{header, HeaderName, HeaderValue};
use axum_test::{TestResponse, TestServer};
use chrono::{TimeZone, Utc};
use pastebin_server::{create_app, AppState, Config, Database, ManualClock};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    _dir: TempDir,
}

pub(crate) fn test_config_for_db_path(db_path: &Path) -> Config {
    Config {
        bind: "127.0.0.1:0".to_string(),
        database_path: db_path.to_str().expect("db path").to_string(),
        ..Config::default()
    }
}

pub(crate) fn setup_test_server() -> TestApp {
    let dir = TempDir::new().expect("temp dir");
    let config = test_config_for_db_path(&dir.path().join("test.redb"));
    let db = Arc::new(Database::new(&config.database_path).expect("open db"));
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .single()
            .expect("time"),
    ));
    let state = AppState::with_clock(config, db, clock.clone());
    let server = TestServer::new(create_app(state.clone())).expect("server");
    TestApp {
        server,
        state,
        clock,
        _dir: dir,
    }
}

/// `Cookie` header carrying the session from a register/login response.
pub(crate) fn session_cookie_from(response: &TestResponse) -> (HeaderName, HeaderValue) {
    let set_cookie = response.header(header::SET_COOKIE);
    let raw = set_cookie.to_str().expect("set-cookie");
    let pair = raw.split(';').next().expect("cookie pair").trim();
    (
        header::COOKIE,
        HeaderValue::from_str(pair).expect("cookie value"),
    )
}

impl TestApp {
    /// Register `username` and return its session cookie header.
    pub(crate) async fn sign_up(&self, username: &str) -> (HeaderName, HeaderValue) {
        let response = self
            .server
            .post("/api/register")
            .json(&json!({ "username": username, "password": "hunter2x" }))
            .await;
        response.assert_status_ok();
        session_cookie_from(&response)
    }

    /// Upload a paste as JSON and return its id.
    pub(crate) async fn upload_json(
        &self,
        auth: Option<&(HeaderName, HeaderValue)>,
        body: serde_json::Value,
    ) -> String {
        let mut request = self.server.post("/upload").json(&body);
        if let Some((name, value)) = auth {
            request = request.add_header(name.clone(), value.clone());
        }
        let response = request.await;
        response.assert_status_ok();
        let created: serde_json::Value = response.json();
        created["id"].as_str().expect("id").to_string()
    }
}
