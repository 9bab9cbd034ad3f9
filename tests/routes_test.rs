// ABOUTME: Route-level integration tests exercising the full axum router in-process
// ABOUTME: Covers JSON envelopes, admin content flow, polling, tracking, and contact capture
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use beacon_site_server::config::ServerConfig;
use beacon_site_server::context::ServerResources;
use beacon_site_server::database::{Database, VERSION_RETENTION};
use beacon_site_server::server::build_router;
use beacon_site_server::sync::{ChangeBroadcaster, ChangeFeed};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

async fn test_app() -> (Router, Arc<ServerResources>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}/test.db", dir.path().display());
    let database = Database::new(&url).await.unwrap();
    database.ensure_admin("system").await.unwrap();

    let broadcaster: Arc<dyn ChangeFeed> = Arc::new(ChangeBroadcaster::new());
    let resources = Arc::new(ServerResources::new(
        database,
        broadcaster,
        ServerConfig::default(),
    ));
    (build_router(resources.clone()), resources, dir)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _resources, _dir) = test_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_content_get_starts_empty() {
    let (app, _resources, _dir) = test_app().await;

    let response = app.oneshot(get("/admin/api/content/get")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["content"], json!([]));
}

#[tokio::test]
async fn test_content_update_creates_version_and_broadcast() {
    let (app, resources, _dir) = test_app().await;

    let request = post_json(
        "/admin/api/content/update",
        &json!({"updates": [{"key": "site_title", "value": "Beacon Bakery"}]}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["updated_items"][0]["key"], "site_title");
    assert_eq!(body["updated_items"][0]["new_value"], "Beacon Bakery");
    assert!(body["version_id"].as_str().is_some());
    assert_eq!(body["message"], "Successfully updated 1 items");

    // The version log recorded the snapshot, attributed to the
    // fallback system admin
    let response = app
        .clone()
        .oneshot(get("/admin/api/content/versions"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["versions"].as_array().unwrap().len(), 1);
    assert_eq!(body["versions"][0]["action"], "Updated 1 items");
    assert_eq!(body["versions"][0]["admin_username"], "system");
    assert_eq!(body["versions"][0]["item_count"], 1);

    // The broadcaster picked the mutation up
    let stats = resources.broadcaster.stats();
    assert_eq!(stats.changes_count, 1);
}

#[tokio::test]
async fn test_content_update_rejects_empty_updates() {
    let (app, _resources, _dir) = test_app().await;

    let request = post_json("/admin/api/content/update", &json!({"updates": []}));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_poll_returns_changes_since_timestamp() {
    let (app, _resources, _dir) = test_app().await;

    let request = post_json(
        "/admin/api/content/update",
        &json!({"updates": [
            {"key": "site_title", "value": "New title"},
            {"key": "tagline", "value": "New tagline"}
        ]}),
    );
    app.clone().oneshot(request).await.unwrap();

    let response = app
        .clone()
        .oneshot(get("/api/realtime/poll?since=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let changes = body["data"]["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0]["key"], "site_title");
    assert_eq!(changes[0]["admin_username"], "system");
    assert!(body["data"]["last_update"].as_f64().unwrap() > 0.0);

    // A client already caught up sees nothing new
    let since = body["data"]["last_update"].as_f64().unwrap();
    let response = app
        .oneshot(get(&format!("/api/realtime/poll?since={since}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["changes"], json!([]));
}

#[tokio::test]
async fn test_poll_without_since_uses_default_window() {
    let (app, resources, _dir) = test_app().await;
    resources
        .broadcaster
        .register_change("site_title", "Fresh", None);

    let response = app.oneshot(get("/api/realtime/poll")).await.unwrap();
    let body = body_json(response).await;
    let changes = body["data"]["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 1);
    // Anonymous mutations are attributed to the system marker
    assert_eq!(changes[0]["admin_username"], "System");
}

#[tokio::test]
async fn test_status_reports_feed_counters() {
    let (app, resources, _dir) = test_app().await;
    resources
        .broadcaster
        .register_change("site_title", "v1", None);
    resources.broadcaster.register_change("tagline", "v2", None);

    let response = app.oneshot(get("/api/realtime/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "active");
    assert_eq!(body["changes_count"], 2);
    assert!(body["last_update"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_rollback_restores_previous_content() {
    let (app, _resources, _dir) = test_app().await;

    let request = post_json(
        "/admin/api/content/update",
        &json!({"updates": [{"key": "site_title", "value": "First"}]}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    let target_id = body_json(response).await["version_id"]
        .as_str()
        .unwrap()
        .to_owned();

    let request = post_json(
        "/admin/api/content/update",
        &json!({"updates": [{"key": "site_title", "value": "Second"}]}),
    );
    app.clone().oneshot(request).await.unwrap();

    let request = post_json(
        "/admin/api/content/rollback",
        &json!({"version_id": target_id}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let response = app
        .clone()
        .oneshot(get("/admin/api/content/get"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let item = body["content"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["key"] == "site_title")
        .unwrap();
    assert_eq!(item["value"], "First");

    // Two updates plus the rollback entry
    let response = app
        .oneshot(get("/admin/api/content/versions"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let versions = body["versions"].as_array().unwrap();
    assert_eq!(versions.len(), 3);
    assert_eq!(
        versions[2]["action"],
        format!("Rollback to version {target_id}")
    );
}

#[tokio::test]
async fn test_rollback_succeeds_when_cap_evicts_target() {
    let (app, resources, _dir) = test_app().await;
    let db = &resources.database;
    let admin_id = db.ensure_admin("system").await.unwrap();

    let request = post_json(
        "/admin/api/content/update",
        &json!({"updates": [{"key": "site_title", "value": "First"}]}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    let target_id = body_json(response).await["version_id"]
        .as_str()
        .unwrap()
        .to_owned();

    let request = post_json(
        "/admin/api/content/update",
        &json!({"updates": [{"key": "site_title", "value": "Second"}]}),
    );
    app.clone().oneshot(request).await.unwrap();

    // Fill the log to exactly the cap with the target as oldest entry
    let snapshot = db.snapshot_settings().await.unwrap();
    for n in 2..VERSION_RETENTION {
        db.create_version(&snapshot, admin_id, &format!("Edit {n}"))
            .await
            .unwrap();
    }

    // The rollback entry pushes the target out of the log; the client
    // still gets success and pollers still see the mutation
    let request = post_json(
        "/admin/api/content/rollback",
        &json!({"version_id": target_id}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let response = app.oneshot(get("/api/realtime/poll?since=0")).await.unwrap();
    let body = body_json(response).await;
    let changes = body["data"]["changes"].as_array().unwrap();
    let last = changes.last().unwrap();
    assert_eq!(last["key"], "site_title");
    assert_eq!(last["value"], "First");

    let setting = resources
        .database
        .get_setting("site_title")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(setting.value, "First");
}

#[tokio::test]
async fn test_rollback_rejects_bad_version_ids() {
    let (app, _resources, _dir) = test_app().await;

    let request = post_json(
        "/admin/api/content/rollback",
        &json!({"version_id": "not-a-uuid"}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_INPUT");

    let request = post_json(
        "/admin/api/content/rollback",
        &json!({"version_id": uuid::Uuid::new_v4().to_string()}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
}

#[tokio::test]
async fn test_track_click_stores_fact() {
    let (app, resources, _dir) = test_app().await;

    let request = post_json(
        "/api/track-click",
        &json!({"button_id": "cta-signup", "button_text": "Sign up", "page_path": "/pricing"}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let summary = resources.database.analytics_summary().await.unwrap();
    assert_eq!(summary.top_buttons[0].button_id, "cta-signup");
    assert_eq!(summary.top_buttons[0].clicks, 1);

    let request = post_json("/api/track-click", &json!({"button_id": ""}));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_form_validation_and_capture() {
    let (app, resources, _dir) = test_app().await;

    // Missing message
    let request = post_json(
        "/api/contact",
        &json!({"name": "Alice", "email": "alice@example.com", "message": ""}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Malformed email
    let request = post_json(
        "/api/contact",
        &json!({"name": "Alice", "email": "not-an-email", "message": "Hi"}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = post_json(
        "/api/contact",
        &json!({"name": "Alice", "email": "alice@example.com", "subject": "Quote", "message": "Hi"}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["id"].as_i64().unwrap() > 0);

    let contacts = resources.database.list_contacts().await.unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].name, "Alice");
    assert!(!contacts[0].interested);
}

fn extract_cookie(response: &axum::response::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .find_map(|value| {
            let raw = value.to_str().ok()?;
            let (cookie, _attrs) = raw.split_once(';')?;
            let (cookie_name, cookie_value) = cookie.split_once('=')?;
            (cookie_name == name).then(|| cookie_value.to_owned())
        })
}

#[tokio::test]
async fn test_page_view_middleware_tracks_sessions() {
    let (app, resources, _dir) = test_app().await;

    let request = Request::builder()
        .uri("/")
        .header(header::REFERER, "https://www.google.com/search?q=beacon")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let visitor = extract_cookie(&response, "visitor_id").unwrap();
    let session = extract_cookie(&response, "session_id").unwrap();
    let session_id = uuid::Uuid::parse_str(&session).unwrap();

    let record = resources
        .database
        .get_session_duration(session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.pages_viewed, 1);

    // Returning visitor with cookies: same session row, counter bumped,
    // no new cookies minted
    let request = Request::builder()
        .uri("/about")
        .header(
            header::COOKIE,
            format!("visitor_id={visitor}; session_id={session}"),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert!(extract_cookie(&response, "session_id").is_none());

    let record = resources
        .database
        .get_session_duration(session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.pages_viewed, 2);

    let summary = resources.database.analytics_summary().await.unwrap();
    assert_eq!(summary.total_page_views, 2);
    assert_eq!(summary.unique_visitors, 1);
    assert_eq!(summary.referral_mediums[0].medium, "organic");
}

#[tokio::test]
async fn test_api_requests_are_not_tracked() {
    let (app, resources, _dir) = test_app().await;

    app.clone()
        .oneshot(get("/api/realtime/status"))
        .await
        .unwrap();
    app.clone().oneshot(get("/health")).await.unwrap();
    app.oneshot(get("/admin/api/content/get")).await.unwrap();

    let summary = resources.database.analytics_summary().await.unwrap();
    assert_eq!(summary.total_page_views, 0);
}
