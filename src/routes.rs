use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{authenticate, require_admin};
use crate::handlers::{
    delete_user_by_id, get_profile, get_user_by_id, health_check, list_users, login, logout,
    register, update_profile, update_user_by_id,
};
use crate::state::AppState;

/// Limit request body size to prevent oversized payloads
const MAX_BODY_SIZE: usize = 1024 * 1024; // 1MB

/// Build the application router.
///
/// Three groups: public endpoints, endpoints behind the authentication gate,
/// and admin endpoints behind both gates. The authentication gate always
/// runs before the admin gate.
pub fn router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/users", post(register))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout));

    let profile_routes = Router::new()
        .route("/users/profile", get(get_profile).put(update_profile))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let admin_routes = Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/{id}",
            get(get_user_by_id)
                .put(update_user_by_id)
                .delete(delete_user_by_id),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .merge(public_routes)
        .merge(profile_routes)
        .merge(admin_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
