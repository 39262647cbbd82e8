use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{clear_session_cookie, hash_password, session_cookie, verify_password, CurrentUser};
use crate::envelope::{success, ApiError, ApiResult};
use crate::state::AppState;
use crate::storage::{CreateUser, StorageError, UserUpdate};

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Own-profile update request; the admin flag is deliberately absent
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Admin update request
#[derive(Debug, Default, Deserialize)]
pub struct AdminUpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "isAdmin")]
    pub is_admin: Option<bool>,
}

/// Treat absent and empty fields the same way
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_user_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound("User not found.".to_string()))
}

/// Register a new account.
///
/// New accounts are never administrators; the flag is only reachable through
/// the admin-gated update path.
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    const REQUIRED: &str = "Username, email, and password are required.";

    let Ok(Json(body)) = body else {
        return Err(ApiError::InvalidInput(REQUIRED.to_string()));
    };
    let (Some(username), Some(email), Some(password)) = (
        non_empty(body.username),
        non_empty(body.email),
        non_empty(body.password),
    ) else {
        return Err(ApiError::InvalidInput(REQUIRED.to_string()));
    };

    // Advisory pre-check; the store's unique constraint is the backstop
    if state
        .user_store
        .email_in_use(&email, None)
        .await
        .map_err(|e| ApiError::from_storage(&state.config, e))?
    {
        return Err(ApiError::Conflict(
            "Email already exists with this email.".to_string(),
        ));
    }

    let password_hash =
        hash_password(&password).map_err(|e| ApiError::internal(&state.config, e))?;

    let user = match state
        .user_store
        .create_user(CreateUser {
            username,
            email,
            password_hash,
            is_admin: false,
        })
        .await
    {
        Ok(user) => user,
        Err(StorageError::DuplicateEmail(_)) => {
            return Err(ApiError::Conflict(
                "Email already exists with this email.".to_string(),
            ))
        }
        Err(e) => return Err(ApiError::internal(&state.config, e)),
    };

    let token = state
        .tokens
        .issue(user.id)
        .map_err(|e| ApiError::internal(&state.config, e))?;
    let jar = jar.add(session_cookie(&state.config, token));

    info!("user {} registered", user.email);

    Ok((
        StatusCode::CREATED,
        jar,
        success(json!({
            "message": "User created successfully",
            "user": { "username": user.username, "email": user.email },
        })),
    ))
}

/// Log in with email and password.
///
/// The unknown-email and wrong-password messages stay distinguishable for
/// compatibility with existing clients.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    const REQUIRED: &str = "Email and password are required.";

    let Ok(Json(body)) = body else {
        return Err(ApiError::InvalidInput(REQUIRED.to_string()));
    };
    let (Some(email), Some(password)) = (non_empty(body.email), non_empty(body.password)) else {
        return Err(ApiError::InvalidInput(REQUIRED.to_string()));
    };

    let user = match state.user_store.get_user_by_email(&email).await {
        Ok(user) => user,
        Err(StorageError::UserNotFound(_)) => {
            warn!("login attempt for unknown email");
            return Err(ApiError::InvalidInput("Invalid email.".to_string()));
        }
        Err(e) => return Err(ApiError::internal(&state.config, e)),
    };

    match verify_password(&password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!("invalid password for {}", user.email);
            return Err(ApiError::InvalidInput("Invalid password.".to_string()));
        }
        Err(e) => return Err(ApiError::internal(&state.config, e)),
    }

    let token = state
        .tokens
        .issue(user.id)
        .map_err(|e| ApiError::internal(&state.config, e))?;
    let jar = jar.add(session_cookie(&state.config, token));

    info!("user {} logged in", user.email);

    Ok((
        jar,
        success(json!({
            "message": "Login successful",
            "user": { "username": user.username, "email": user.email },
        })),
    ))
}

/// Log out by clearing the session cookie.
///
/// The token itself stays valid until expiry; ending the session is purely a
/// matter of removing the cookie from the browser.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let jar = jar.add(clear_session_cookie(&state.config));
    Ok((jar, success(json!({ "message": "Logout successful" }))))
}

/// List all users (admin only); password hashes never serialize
pub async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let users: Vec<CurrentUser> = state
        .user_store
        .list_users()
        .await
        .map_err(|e| ApiError::from_storage(&state.config, e))?
        .into_iter()
        .map(CurrentUser::from)
        .collect();

    Ok(success(json!({ "users": users })))
}

/// Get the authenticated user's own profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_store
        .get_user(current.id)
        .await
        .map_err(|e| ApiError::from_storage(&state.config, e))?;

    Ok(success(json!({ "user": CurrentUser::from(user) })))
}

/// Update the authenticated user's own profile.
///
/// Email changes re-check uniqueness against all other accounts; a new
/// password is re-hashed; the admin flag cannot be reached from here.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    // An absent or empty body is a no-op update, as with the other optional
    // fields
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let username = non_empty(body.username);
    let email = non_empty(body.email);
    let password = non_empty(body.password);

    if let Some(email) = &email {
        if state
            .user_store
            .email_in_use(email, Some(current.id))
            .await
            .map_err(|e| ApiError::from_storage(&state.config, e))?
        {
            return Err(ApiError::Conflict("Email already exists.".to_string()));
        }
    }

    let password_hash = match password {
        Some(password) => {
            Some(hash_password(&password).map_err(|e| ApiError::internal(&state.config, e))?)
        }
        None => None,
    };

    let updated = state
        .user_store
        .update_user(
            current.id,
            UserUpdate {
                username,
                email,
                password_hash,
                is_admin: None,
            },
        )
        .await
        .map_err(|e| ApiError::from_storage(&state.config, e))?;

    Ok(success(json!({
        "message": "User profile updated successfully",
        "user": { "username": updated.username, "email": updated.email },
    })))
}

/// Delete a user by id (admin only).
///
/// Administrator accounts cannot be deleted through this path, regardless of
/// who asks.
pub async fn delete_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_user_id(&id)?;

    let user = state
        .user_store
        .get_user(id)
        .await
        .map_err(|e| ApiError::from_storage(&state.config, e))?;

    if user.is_admin {
        return Err(ApiError::Conflict("Cannot delete an admin user.".to_string()));
    }

    state
        .user_store
        .delete_user(id)
        .await
        .map_err(|e| ApiError::from_storage(&state.config, e))?;

    info!("user {} deleted", user.email);

    Ok(success(json!({ "message": "User deleted successfully." })))
}

/// Get a user by id (admin only)
pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_user_id(&id)?;

    let user = state
        .user_store
        .get_user(id)
        .await
        .map_err(|e| ApiError::from_storage(&state.config, e))?;

    Ok(success(json!({ "user": CurrentUser::from(user) })))
}

/// Update a user by id (admin only); the one path where the admin flag moves
pub async fn update_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<AdminUpdateRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_user_id(&id)?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let username = non_empty(body.username);
    let email = non_empty(body.email);

    // 404 before conflict checks, matching the lookup-first contract
    let _ = state
        .user_store
        .get_user(id)
        .await
        .map_err(|e| ApiError::from_storage(&state.config, e))?;

    if let Some(email) = &email {
        if state
            .user_store
            .email_in_use(email, Some(id))
            .await
            .map_err(|e| ApiError::from_storage(&state.config, e))?
        {
            return Err(ApiError::Conflict("Email already exists.".to_string()));
        }
    }

    let updated = state
        .user_store
        .update_user(
            id,
            UserUpdate {
                username,
                email,
                password_hash: None,
                is_admin: body.is_admin,
            },
        )
        .await
        .map_err(|e| ApiError::from_storage(&state.config, e))?;

    Ok(success(json!({
        "message": "User updated successfully",
        "user": {
            "username": updated.username,
            "email": updated.email,
            "isAdmin": updated.is_admin,
        },
    })))
}
