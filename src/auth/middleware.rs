use axum::{
    extract::{Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::cookie::extract_token;
use crate::envelope::ApiError;
use crate::state::AppState;
use crate::storage::{StorageError, User};

/// Request-scoped authenticated identity: the resolved user record with the
/// password hash projected out at the type level.
///
/// Attached to request extensions by [`authenticate`], consumed by handlers
/// and [`require_admin`], dropped when the request ends. Never shared across
/// requests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthenticated("Not authorized, no token".to_string()))
    }
}

/// Authentication gate.
///
/// Extracts the session cookie, verifies the token, resolves the subject to
/// a user record, and attaches the identity to the request. Each failure is
/// terminal for the request; there are no retries and no side effects beyond
/// the identity attachment.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(&jar) else {
        return ApiError::Unauthenticated("Not authorized, no token".to_string()).into_response();
    };

    let subject = match state.tokens.verify(&token) {
        Ok(subject) => subject,
        Err(_) => {
            warn!("rejected request carrying an invalid session token");
            return ApiError::Unauthenticated("Not authorized, token failed".to_string())
                .into_response();
        }
    };

    // The account may have been deleted after the token was issued; a
    // missing subject is indistinguishable from an invalid token.
    let user = match state.user_store.get_user(subject).await {
        Ok(user) => user,
        Err(StorageError::UserNotFound(_)) => {
            warn!("valid token for missing account {}", subject);
            return ApiError::Unauthenticated("Not authorized, token failed".to_string())
                .into_response();
        }
        Err(e) => return ApiError::internal(&state.config, e).into_response(),
    };

    request.extensions_mut().insert(CurrentUser::from(user));
    next.run(request).await
}

/// Authorization gate: administrators only.
///
/// Runs strictly after [`authenticate`]; an absent identity is rejected,
/// never re-authenticated.
pub async fn require_admin(request: Request, next: Next) -> Response {
    match request.extensions().get::<CurrentUser>() {
        Some(user) if user.is_admin => next.run(request).await,
        _ => ApiError::Forbidden("Not authorized as an admin".to_string()).into_response(),
    }
}
