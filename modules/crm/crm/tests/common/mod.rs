//! Shared setup for the CRM integration tests: a file-backed `SQLite`
//! database, migrated, seeded and loaded with `tests/fixtures/crm.yaml`.
#![allow(dead_code)]

use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use crm::domain::profile::Actor;
use crm::infra::fixtures::{FixtureSet, load};
use crm::{CrmConfig, CrmModule};
use crm_db::{ConnectOpts, connect_db};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "N3wpolo6";

pub struct TestApp {
    pub module: CrmModule,
    _dir: TempDir,
}

pub async fn setup() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let dsn = format!("sqlite://{}?mode=rwc", dir.path().join("crm.db").display());
    let db = connect_db(&dsn, &ConnectOpts::default()).await.unwrap();
    let module = CrmModule::init(db, &CrmConfig::default()).await.unwrap();

    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/crm.yaml");
    let set = FixtureSet::from_path(&fixtures).unwrap();
    load(module.db(), &set).await.unwrap();

    TestApp { module, _dir: dir }
}

impl TestApp {
    /// Log `username` in and resolve the resulting session to an actor.
    pub async fn actor(&self, username: &str) -> Actor {
        let auth = &self.module.services().auth;
        let session = auth.login(Some(username), Some(PASSWORD)).await.unwrap();
        auth.resolve_actor(&session.token).await.unwrap()
    }

    pub fn router(&self) -> Router {
        self.module.router().unwrap()
    }

    /// Log in over HTTP and return the bearer token.
    pub async fn token(&self, username: &str) -> String {
        let (status, body) = send(
            &self.router(),
            Method::POST,
            "/login/",
            None,
            Some(serde_json::json!({"username": username, "password": PASSWORD})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed for {username}: {body}");
        body["token"].as_str().unwrap().to_owned()
    }
}

/// Send one request through the router; an empty response body reads as `Null`.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
