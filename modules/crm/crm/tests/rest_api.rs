//! HTTP permission matrix, login and logout.

mod common;

use axum::http::{Method, StatusCode};
use common::send;
use serde_json::json;

#[tokio::test]
async fn login_validates_and_rejects_bad_credentials() {
    let app = common::setup().await;
    let router = app.router();

    let (status, body) = send(
        &router,
        Method::POST,
        "/login/",
        None,
        Some(json!({"username": "sales_contact_01"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (status, _) = send(
        &router,
        Method::POST,
        "/login/",
        None,
        Some(json!({"username": "", "password": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &router,
        Method::POST,
        "/login/",
        None,
        Some(json!({"username": "sales_contact_01", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["title"], "Forbidden");
}

#[tokio::test]
async fn login_accepts_post_only() {
    let app = common::setup().await;
    let router = app.router();

    for method in [Method::GET, Method::PUT, Method::PATCH, Method::DELETE] {
        let (status, _) = send(&router, method.clone(), "/login/", None, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
    }
}

#[tokio::test]
async fn login_returns_groups_and_logout_ends_the_session() {
    let app = common::setup().await;
    let router = app.router();

    let (status, body) = send(
        &router,
        Method::POST,
        "/login/",
        None,
        Some(json!({"username": "support_contact_01", "password": common::PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "support_contact_01");
    assert_eq!(body["groups"], json!(["SUPPORT"]));
    let token = body["token"].as_str().unwrap().to_owned();
    assert_eq!(token.len(), 64);

    let (status, _) = send(&router, Method::GET, "/events/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, Method::POST, "/logout/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "You are now logged out"}));

    let (status, _) = send(&router, Method::GET, "/events/", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn requests_without_a_valid_token_are_unauthorized() {
    let app = common::setup().await;
    let router = app.router();

    let (status, body) = send(&router, Method::GET, "/clients/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);

    let (status, _) = send(&router, Method::GET, "/clients/", Some("deadbeef"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, Method::GET, "/eventstatuses/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_user_is_forbidden_everywhere() {
    let app = common::setup().await;
    let router = app.router();
    let token = app.token("anonymous_user").await;

    for uri in [
        "/clients/",
        "/contracts/",
        "/events/",
        "/salescontacts/",
        "/clients/1/",
    ] {
        let (status, _) = send(&router, Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
    }

    let (status, body) = send(&router, Method::GET, "/eventstatuses/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[1]["status"], "IN PROGRESS");
}

#[tokio::test]
async fn client_permissions() {
    let app = common::setup().await;
    let router = app.router();
    let sales = app.token("sales_contact_01").await;
    let support = app.token("support_contact_01").await;
    let staff = app.token("staff_contact_01").await;

    let new_client = json!({
        "first_name": "Lucie",
        "last_name": "Martin",
        "email": "lucie.martin@example.com",
        "phone": "0199999999",
        "sales_contact_id": 1,
    });
    let (status, body) = send(
        &router,
        Method::POST,
        "/clients/",
        Some(&sales),
        Some(new_client.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["mobile"], "");
    let created = body["id"].as_i64().unwrap();

    let (status, _) = send(&router, Method::POST, "/clients/", Some(&sales), Some(new_client)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &router,
        Method::PATCH,
        &format!("/clients/{created}/"),
        Some(&sales),
        Some(json!({"mobile": "0600000000"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mobile"], "0600000000");

    let (status, _) = send(
        &router,
        Method::PATCH,
        "/clients/1/",
        Some(&support),
        Some(json!({"mobile": "0600000000"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&router, Method::GET, "/clients/1/", Some(&support), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&router, Method::DELETE, "/clients/1/", Some(&sales), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&router, Method::DELETE, "/clients/1/", Some(&staff), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = send(&router, Method::GET, "/clients/1/", Some(&staff), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn client_put_requires_every_create_field() {
    let app = common::setup().await;
    let router = app.router();
    let staff = app.token("staff_contact_01").await;

    let (status, body) = send(
        &router,
        Method::PUT,
        "/clients/1/",
        Some(&staff),
        Some(json!({"first_name": "Pierre"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("last_name"));
}

#[tokio::test]
async fn contract_permissions() {
    let app = common::setup().await;
    let router = app.router();
    let sales = app.token("sales_contact_01").await;
    let support = app.token("support_contact_01").await;

    let (status, _) = send(&router, Method::GET, "/contracts/", Some(&support), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &router,
        Method::POST,
        "/contracts/",
        Some(&sales),
        Some(json!({"sales_contact_id": 1, "client_id": 1, "amount": "2000.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], false);

    let (status, _) = send(
        &router,
        Method::PATCH,
        "/contracts/1/",
        Some(&sales),
        Some(json!({"amount": "9999.00", "payment_due": "2024-06-30T12:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &router,
        Method::PATCH,
        "/contracts/1/",
        Some(&sales),
        Some(json!({
            "status": true,
            "amount": "1500.00",
            "payment_due": "2024-06-30T12:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], true);

    let (status, _) = send(&router, Method::DELETE, "/contracts/1/", Some(&sales), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &router,
        Method::POST,
        "/contracts/",
        Some(&sales),
        Some(json!({"sales_contact_id": 1, "client_id": 1, "amount": "-1.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn event_permissions() {
    let app = common::setup().await;
    let router = app.router();
    let sales = app.token("sales_contact_01").await;
    let support = app.token("support_contact_01").await;
    let staff = app.token("staff_contact_01").await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/events/",
        Some(&sales),
        Some(json!({"client_id": 1, "support_contact_id": 1, "attendees": 30})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["event_status"], json!({"status": "CREATED"}));
    assert_eq!(body["event_status_id"], 1);

    let (status, body) = send(
        &router,
        Method::PATCH,
        "/events/1/",
        Some(&support),
        Some(json!({"event_status": {"status": "ENDED"}, "notes": "Went well"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event_status_id"], 3);
    assert_eq!(body["notes"], "Went well");

    let (status, _) = send(
        &router,
        Method::PATCH,
        "/events/2/",
        Some(&support),
        Some(json!({"notes": "not mine"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &router,
        Method::PATCH,
        "/events/1/",
        Some(&sales),
        Some(json!({"attendees": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&router, Method::DELETE, "/events/1/", Some(&support), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&router, Method::DELETE, "/events/1/", Some(&staff), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn contacts_are_staff_only() {
    let app = common::setup().await;
    let router = app.router();
    let staff = app.token("staff_contact_01").await;
    let sales = app.token("sales_contact_01").await;

    let (status, body) = send(&router, Method::GET, "/salescontacts/", Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["user"]["username"], "sales_contact_01");
    assert!(body[0].get("kind").is_none());

    let (status, _) = send(&router, Method::GET, "/salescontacts/", Some(&sales), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &router,
        Method::POST,
        "/supportcontacts/",
        Some(&staff),
        Some(json!({"user": {"username": "support_contact_02", "password": "Tk1nt3r0K"}})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["groups"], json!(["SUPPORT"]));
    assert!(body["user"].get("password").is_none());
    let contact_id = body["id"].as_i64().unwrap();

    let (status, _) = send(
        &router,
        Method::POST,
        "/login/",
        None,
        Some(json!({"username": "support_contact_02", "password": "Tk1nt3r0K"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &router,
        Method::PUT,
        &format!("/supportcontacts/{contact_id}/"),
        Some(&staff),
        Some(json!({"user": {"username": "someone_else", "password": "An0therPass"}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        Method::PATCH,
        &format!("/supportcontacts/{contact_id}/"),
        Some(&staff),
        Some(json!({"user": {"password": "An0therPass"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &router,
        Method::DELETE,
        &format!("/supportcontacts/{contact_id}/"),
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn non_numeric_ids_are_validation_errors() {
    let app = common::setup().await;
    let router = app.router();
    let staff = app.token("staff_contact_01").await;

    for uri in ["/clients/abc/", "/contracts/1x/", "/events/-/", "/salescontacts/one/"] {
        let (status, body) = send(&router, Method::GET, uri, Some(&staff), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["status"], 400, "{uri}");
        assert!(body["detail"].as_str().is_some(), "{uri}");
    }

    let (status, body) = send(
        &router,
        Method::PATCH,
        "/clients/abc/",
        Some(&staff),
        Some(json!({"first_name": "Pierre"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}
