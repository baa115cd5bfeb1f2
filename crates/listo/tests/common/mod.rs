//! Shared helpers for integration tests.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use listo::api::{AppState, build_router};
use listo::auth::{AuthConfig, AuthState};
use listo::db::Database;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";

pub async fn test_app() -> (Router, AppState) {
    let db = Database::in_memory().await.expect("in-memory database");
    let auth = AuthState::new(AuthConfig {
        jwt_secret: Some(TEST_SECRET.to_string()),
        ..AuthConfig::default()
    });
    let state = AppState::new(db, auth);
    (build_router(state.clone()), state)
}

/// Fire one request at the app and decode the JSON response (if any).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// Register a user and return their access token.
pub async fn register_user(app: &Router, email: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "hunter2hunter2",
            "name": name,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["access_token"]
        .as_str()
        .expect("access token")
        .to_string()
}

/// Look up the calling user's ID via /auth/me.
pub async fn user_id_of(app: &Router, token: &str) -> String {
    let (status, body) = send(app, "GET", "/api/v1/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK, "me failed: {body}");
    body["id"].as_str().expect("user id").to_string()
}

/// Create a list and return its ID.
pub async fn create_list(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/lists",
        Some(token),
        Some(json!({ "name": name })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "create list failed: {body}");
    body["id"].as_str().expect("list id").to_string()
}

/// Create an item and return its ID.
pub async fn create_item(app: &Router, token: &str, list_id: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/v1/lists/{list_id}/items"),
        Some(token),
        Some(json!({ "name": name })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "create item failed: {body}");
    body["id"].as_str().expect("item id").to_string()
}
