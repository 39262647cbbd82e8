//! Integration tests for the account lifecycle endpoints.
//!
//! Registration, login, profile reads and updates, and the admin management
//! surface, all through the real router against the in-memory store.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use accountd::auth::{hash_password, verify_password};
use accountd::config::ServerConfig;
use accountd::routes::router;
use accountd::state::AppState;
use accountd::storage::{CreateUser, MemoryUserStore, User, UserStore};

fn test_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        bind_addr: "127.0.0.1".to_string(),
        database_url: "postgres://unused".to_string(),
        token_secret: "integration-test-secret-0123456789ab".to_string(),
        production: false,
    }
}

fn setup() -> (axum::Router, Arc<AppState>, MemoryUserStore) {
    let store = MemoryUserStore::new();
    let state = Arc::new(AppState::new(test_config(), Arc::new(store.clone())));
    (router(state.clone()), state, store)
}

async fn seed_user(store: &MemoryUserStore, email: &str, password: &str, is_admin: bool) -> User {
    store
        .create_user(CreateUser {
            username: email.split('@').next().unwrap().to_string(),
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            is_admin,
        })
        .await
        .unwrap()
}

fn cookie_for(state: &AppState, id: Uuid) -> String {
    format!("token={}", state.tokens.issue(id).unwrap())
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_request_as(method: &str, uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_creates_account_and_session() {
    let (app, _state, store) = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/users",
            json!({ "username": "a", "email": "a@x.com", "password": "pw" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Max-Age=2592000"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let raw = String::from_utf8(bytes.to_vec()).unwrap();

    // The password must not appear anywhere in the response, in any form
    assert!(!raw.contains("password"));
    assert!(!raw.contains("pw"));

    let body: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["message"], "User created successfully");
    assert_eq!(body["data"]["user"], json!({ "username": "a", "email": "a@x.com" }));

    // Stored hash is not the plaintext, and verifies
    let stored = store.get_user_by_email("a@x.com").await.unwrap();
    assert_ne!(stored.password_hash, "pw");
    assert!(verify_password("pw", &stored.password_hash).unwrap());
    assert!(!stored.is_admin);
}

#[tokio::test]
async fn test_register_requires_all_fields() {
    let (app, _state, store) = setup();

    for body in [
        json!({}),
        json!({ "username": "a" }),
        json!({ "username": "a", "email": "a@x.com" }),
        json!({ "username": "a", "email": "a@x.com", "password": "" }),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/users", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(
            body["data"]["message"],
            "Username, email, and password are required."
        );
    }

    assert!(store.is_empty());
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let (app, _state, store) = setup();
    seed_user(&store, "a@x.com", "pw", false).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/users",
            json!({ "username": "other", "email": "a@x.com", "password": "pw2" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["data"]["message"],
        "Email already exists with this email."
    );
    assert_eq!(store.len(), 1);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_succeeds_with_correct_credentials() {
    let (app, _state, store) = setup();
    seed_user(&store, "a@x.com", "pw", false).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/users/login",
            json!({ "email": "a@x.com", "password": "pw" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::SET_COOKIE));

    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Login successful");
    assert_eq!(body["data"]["user"]["email"], "a@x.com");
}

#[tokio::test]
async fn test_login_rejects_unknown_email() {
    let (app, _state, _store) = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/users/login",
            json!({ "email": "nobody@x.com", "password": "pw" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Invalid email.");
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let (app, _state, store) = setup();
    seed_user(&store, "a@x.com", "pw", false).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/users/login",
            json!({ "email": "a@x.com", "password": "wrong" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Invalid password.");
}

#[tokio::test]
async fn test_login_requires_fields() {
    let (app, _state, _store) = setup();

    let response = app
        .oneshot(json_request("POST", "/users/login", json!({ "email": "a@x.com" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Email and password are required.");
}

// ============================================================================
// Register -> bad login -> unauthenticated profile, end to end
// ============================================================================

#[tokio::test]
async fn test_full_session_scenario() {
    let (app, _state, _store) = setup();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/users",
            json!({ "username": "a", "email": "a@x.com", "password": "pw" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key(header::SET_COOKIE));
    let body = body_json(response).await;
    assert_eq!(body["data"]["user"], json!({ "username": "a", "email": "a@x.com" }));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/users/login",
            json!({ "email": "a@x.com", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Invalid password.");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/profile")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_profile_roundtrip() {
    let (app, state, store) = setup();
    let user = seed_user(&store, "a@x.com", "pw", false).await;
    let cookie = cookie_for(&state, user.id);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/profile")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let raw = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!raw.contains("password"));

    let body: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(body["data"]["user"]["id"], user.id.to_string());
    assert_eq!(body["data"]["user"]["username"], "a");
    assert_eq!(body["data"]["user"]["isAdmin"], false);
}

#[tokio::test]
async fn test_update_profile_changes_fields() {
    let (app, state, store) = setup();
    let user = seed_user(&store, "a@x.com", "pw", false).await;
    let cookie = cookie_for(&state, user.id);

    let response = app
        .oneshot(json_request_as(
            "PUT",
            "/users/profile",
            &cookie,
            json!({ "username": "renamed", "email": "new@x.com", "password": "better" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "User profile updated successfully");
    assert_eq!(
        body["data"]["user"],
        json!({ "username": "renamed", "email": "new@x.com" })
    );

    let stored = store.get_user(user.id).await.unwrap();
    assert_eq!(stored.username, "renamed");
    assert!(verify_password("better", &stored.password_hash).unwrap());
}

#[tokio::test]
async fn test_update_profile_rejects_email_of_other_account() {
    let (app, state, store) = setup();
    seed_user(&store, "taken@x.com", "pw", false).await;
    let user = seed_user(&store, "a@x.com", "pw", false).await;
    let cookie = cookie_for(&state, user.id);

    let response = app
        .oneshot(json_request_as(
            "PUT",
            "/users/profile",
            &cookie,
            json!({ "email": "taken@x.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Email already exists.");
}

#[tokio::test]
async fn test_update_profile_cannot_grant_admin() {
    let (app, state, store) = setup();
    let user = seed_user(&store, "a@x.com", "pw", false).await;
    let cookie = cookie_for(&state, user.id);

    let response = app
        .oneshot(json_request_as(
            "PUT",
            "/users/profile",
            &cookie,
            json!({ "isAdmin": true }),
        ))
        .await
        .unwrap();

    // The field is not part of the profile contract and is ignored
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!store.get_user(user.id).await.unwrap().is_admin);
}

// ============================================================================
// Admin management
// ============================================================================

#[tokio::test]
async fn test_admin_get_user_by_id() {
    let (app, state, store) = setup();
    let admin = seed_user(&store, "root@x.com", "pw", true).await;
    let user = seed_user(&store, "a@x.com", "pw", false).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/users/{}", user.id))
                .header(header::COOKIE, cookie_for(&state, admin.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["user"]["email"], "a@x.com");
}

#[tokio::test]
async fn test_admin_get_unknown_id_is_not_found() {
    let (app, state, store) = setup();
    let admin = seed_user(&store, "root@x.com", "pw", true).await;

    for uri in [
        format!("/users/{}", Uuid::new_v4()),
        "/users/not-a-uuid".to_string(),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(header::COOKIE, cookie_for(&state, admin.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["data"]["message"], "User not found.");
    }
}

#[tokio::test]
async fn test_admin_can_promote_user() {
    let (app, state, store) = setup();
    let admin = seed_user(&store, "root@x.com", "pw", true).await;
    let user = seed_user(&store, "a@x.com", "pw", false).await;

    let response = app
        .oneshot(json_request_as(
            "PUT",
            &format!("/users/{}", user.id),
            &cookie_for(&state, admin.id),
            json!({ "isAdmin": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "User updated successfully");
    assert_eq!(
        body["data"]["user"],
        json!({ "username": "a", "email": "a@x.com", "isAdmin": true })
    );
    assert!(store.get_user(user.id).await.unwrap().is_admin);
}

#[tokio::test]
async fn test_admin_update_rejects_taken_email() {
    let (app, state, store) = setup();
    let admin = seed_user(&store, "root@x.com", "pw", true).await;
    let user = seed_user(&store, "a@x.com", "pw", false).await;

    let response = app
        .oneshot(json_request_as(
            "PUT",
            &format!("/users/{}", user.id),
            &cookie_for(&state, admin.id),
            json!({ "email": "root@x.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Email already exists.");
}

#[tokio::test]
async fn test_admin_delete_user() {
    let (app, state, store) = setup();
    let admin = seed_user(&store, "root@x.com", "pw", true).await;
    let user = seed_user(&store, "a@x.com", "pw", false).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/users/{}", user.id))
                .header(header::COOKIE, cookie_for(&state, admin.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "User deleted successfully.");
    assert!(store.get_user(user.id).await.is_err());
}

#[tokio::test]
async fn test_admin_accounts_cannot_be_deleted() {
    let (app, state, store) = setup();
    let admin = seed_user(&store, "root@x.com", "pw", true).await;
    let other_admin = seed_user(&store, "root2@x.com", "pw", true).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/users/{}", other_admin.id))
                .header(header::COOKIE, cookie_for(&state, admin.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Cannot delete an admin user.");
    assert!(store.get_user(other_admin.id).await.is_ok());
}

#[tokio::test]
async fn test_list_users_never_serializes_password_material() {
    let (app, state, store) = setup();
    let admin = seed_user(&store, "root@x.com", "pw", true).await;
    seed_user(&store, "a@x.com", "pw", false).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users")
                .header(header::COOKIE, cookie_for(&state, admin.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let raw = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!raw.contains("password"));
    assert!(!raw.contains("$2b$"));
}
