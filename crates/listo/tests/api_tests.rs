//! End-to-end tests for the HTTP API.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{create_item, create_list, register_user, send, test_app, user_id_of};

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, "GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_login_me() {
    let (app, _) = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({
            "email": "Ana@Example.com",
            "password": "hunter2hunter2",
            "name": "Ana",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    // Emails are normalized to lowercase.
    assert_eq!(body["user"]["email"], "ana@example.com");
    assert!(body["user"]["password_hash"].is_null());

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({
            "email": "ana@example.com",
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ana@example.com");
    assert_eq!(body["name"], "Ana");
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let (app, _) = test_app().await;
    register_user(&app, "dup@example.com", "First").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({
            "email": "dup@example.com",
            "password": "hunter2hunter2",
            "name": "Second",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (app, _) = test_app().await;
    register_user(&app, "ana@example.com", "Ana").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({
            "email": "ana@example.com",
            "password": "wrong-password",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let (app, _) = test_app().await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({
            "email": "ana@example.com",
            "password": "hunter2hunter2",
            "name": "Ana",
        })),
    )
    .await;
    let access = body["access_token"].as_str().unwrap().to_string();
    let refresh = body["refresh_token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    // An access token is not accepted as a refresh token.
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": access })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let (app, _) = test_app().await;

    let (status, _) = send(&app, "GET", "/api/v1/lists", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/v1/lists", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_crud() {
    let (app, _) = test_app().await;
    let token = register_user(&app, "ana@example.com", "Ana").await;

    let list_id = create_list(&app, &token, "Groceries").await;

    let (status, body) = send(&app, "GET", "/api/v1/lists", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Groceries");
    assert_eq!(body[0]["color"], "#4CAF50");

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/v1/lists/{list_id}"),
        Some(&token),
        Some(json!({ "name": "Weekly shop", "color": "#FF5722" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Weekly shop");
    assert_eq!(body["color"], "#FF5722");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/lists/{list_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/v1/lists/{list_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_validation() {
    let (app, _) = test_app().await;
    let token = register_user(&app, "ana@example.com", "Ana").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/lists",
        Some(&token),
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/lists",
        Some(&token),
        Some(json!({ "name": "Ok", "color": "green" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_item_lifecycle() {
    let (app, _) = test_app().await;
    let token = register_user(&app, "ana@example.com", "Ana").await;
    let list_id = create_list(&app, &token, "Groceries").await;

    let item_id = create_item(&app, &token, &list_id, "Milk").await;

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/v1/lists/{list_id}/items/{item_id}"),
        Some(&token),
        Some(json!({ "quantity": 3, "unit": "l" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 3);
    assert_eq!(body["unit"], "l");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/lists/{list_id}/items/{item_id}/toggle"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_checked"], true);
    assert!(body["checked_by"].is_string());
    assert!(body["checked_at"].is_string());

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/lists/{list_id}/items/{item_id}/toggle"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_checked"], false);
    assert!(body["checked_by"].is_null());

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/lists/{list_id}/items/{item_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/lists/{list_id}/items"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_items_sorted_by_sort_index() {
    let (app, _) = test_app().await;
    let token = register_user(&app, "ana@example.com", "Ana").await;
    let list_id = create_list(&app, &token, "Groceries").await;

    for (name, sort_index) in [("Third", 30), ("First", 10), ("Second", 20)] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/lists/{list_id}/items"),
            Some(&token),
            Some(json!({ "name": name, "sort_index": sort_index })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/lists/{list_id}/items"),
        Some(&token),
        None,
    )
    .await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["First", "Second", "Third"]);
}

#[tokio::test]
async fn test_non_members_are_locked_out() {
    let (app, _) = test_app().await;
    let ana = register_user(&app, "ana@example.com", "Ana").await;
    let bob = register_user(&app, "bob@example.com", "Bob").await;
    let list_id = create_list(&app, &ana, "Ana's list").await;

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/v1/lists/{list_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/lists/{list_id}/items"),
        Some(&bob),
        Some(json!({ "name": "Sneaky" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/lists/{list_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_owner_manages_members() {
    let (app, _) = test_app().await;
    let ana = register_user(&app, "ana@example.com", "Ana").await;
    let bob = register_user(&app, "bob@example.com", "Bob").await;
    let bob_id = user_id_of(&app, &bob).await;
    let list_id = create_list(&app, &ana, "Shared").await;
    let members_uri = format!("/api/v1/lists/{list_id}/members");

    let (status, body) = send(
        &app,
        "POST",
        &members_uri,
        Some(&ana),
        Some(json!({ "user_id": bob_id, "role": "editor" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "add member failed: {body}");
    assert_eq!(body["user_id"], bob_id.as_str());
    assert_eq!(body["user_name"], "Bob");
    assert_eq!(body["role"], "editor");

    // Adding the same user twice conflicts.
    let (status, _) = send(
        &app,
        "POST",
        &members_uri,
        Some(&ana),
        Some(json!({ "user_id": bob_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A second owner cannot be appointed.
    let carol = register_user(&app, "carol@example.com", "Carol").await;
    let carol_id = user_id_of(&app, &carol).await;
    let (status, _) = send(
        &app,
        "POST",
        &members_uri,
        Some(&ana),
        Some(json!({ "user_id": carol_id, "role": "owner" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown users can't be added.
    let (status, _) = send(
        &app,
        "POST",
        &members_uri,
        Some(&ana),
        Some(json!({ "user_id": "no-such-user" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", &members_uri, Some(&ana), None).await;
    assert_eq!(status, StatusCode::OK);
    let roster = body.as_array().unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0]["role"], "owner");
    assert_eq!(roster[1]["role"], "editor");
}

#[tokio::test]
async fn test_editor_can_edit_but_not_administer() {
    let (app, _) = test_app().await;
    let ana = register_user(&app, "ana@example.com", "Ana").await;
    let bob = register_user(&app, "bob@example.com", "Bob").await;
    let bob_id = user_id_of(&app, &bob).await;
    let list_id = create_list(&app, &ana, "Shared").await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/lists/{list_id}/members"),
        Some(&ana),
        Some(json!({ "user_id": bob_id, "role": "editor" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Editors mutate the list and its items.
    create_item(&app, &bob, &list_id, "Milk").await;
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/v1/lists/{list_id}"),
        Some(&bob),
        Some(json!({ "name": "Renamed by Bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "editor update failed: {body}");

    // But deletion and membership stay owner-only.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/lists/{list_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let carol = register_user(&app, "carol@example.com", "Carol").await;
    let carol_id = user_id_of(&app, &carol).await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/lists/{list_id}/members"),
        Some(&bob),
        Some(json!({ "user_id": carol_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_viewer_is_read_only_until_promoted() {
    let (app, _) = test_app().await;
    let ana = register_user(&app, "ana@example.com", "Ana").await;
    let carol = register_user(&app, "carol@example.com", "Carol").await;
    let carol_id = user_id_of(&app, &carol).await;
    let list_id = create_list(&app, &ana, "Shared").await;
    create_item(&app, &ana, &list_id, "Milk").await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/lists/{list_id}/members"),
        Some(&ana),
        Some(json!({ "user_id": carol_id, "role": "viewer" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Viewers read but don't write.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/lists/{list_id}/items"),
        Some(&carol),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/lists/{list_id}/items"),
        Some(&carol),
        Some(json!({ "name": "Bread" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/v1/lists/{list_id}"),
        Some(&carol),
        Some(json!({ "name": "Carol's now" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Promotion to editor unlocks writes.
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/v1/lists/{list_id}/members/{carol_id}"),
        Some(&ana),
        Some(json!({ "role": "editor" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "editor");

    create_item(&app, &carol, &list_id, "Bread").await;
}

#[tokio::test]
async fn test_member_removal_rules() {
    let (app, _) = test_app().await;
    let ana = register_user(&app, "ana@example.com", "Ana").await;
    let ana_id = user_id_of(&app, &ana).await;
    let bob = register_user(&app, "bob@example.com", "Bob").await;
    let bob_id = user_id_of(&app, &bob).await;
    let carol = register_user(&app, "carol@example.com", "Carol").await;
    let carol_id = user_id_of(&app, &carol).await;
    let list_id = create_list(&app, &ana, "Shared").await;

    for (user_id, role) in [(&bob_id, "editor"), (&carol_id, "viewer")] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/lists/{list_id}/members"),
            Some(&ana),
            Some(json!({ "user_id": user_id, "role": role })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Members can't remove each other.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/lists/{list_id}/members/{carol_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner can't be removed.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/lists/{list_id}/members/{ana_id}"),
        Some(&ana),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A member may leave on their own.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/lists/{list_id}/members/{carol_id}"),
        Some(&carol),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The owner removes anyone else; access ends immediately.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/lists/{list_id}/members/{bob_id}"),
        Some(&ana),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/v1/lists/{list_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Removing someone who isn't a member any more is a 404.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/lists/{list_id}/members/{bob_id}"),
        Some(&ana),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_presence_endpoint() {
    let (app, state) = test_app().await;
    let token = register_user(&app, "ana@example.com", "Ana").await;
    let list_id = create_list(&app, &token, "Groceries").await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/lists/{list_id}/presence"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["users"].as_array().unwrap().is_empty());

    // Presence reflects hub connections, not REST activity.
    let _handle = state.hub.connect(&list_id, "u-ws", "Websocket User");
    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/lists/{list_id}/presence"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["users"][0]["user_name"], "Websocket User");
}

#[tokio::test]
async fn test_rest_mutations_broadcast_to_hub() {
    let (app, state) = test_app().await;
    let token = register_user(&app, "ana@example.com", "Ana").await;
    let list_id = create_list(&app, &token, "Groceries").await;

    let mut handle = state.hub.connect(&list_id, "u-ws", "Watcher");
    create_item(&app, &token, &list_id, "Milk").await;

    let event = handle.receiver.try_recv().expect("broadcast event");
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "item_added");
    assert_eq!(json["item"]["name"], "Milk");
}
