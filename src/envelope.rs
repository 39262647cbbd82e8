//! Uniform response envelope.
//!
//! Every endpoint answers with one of three shapes: `{status: "success",
//! data}` for success, `{status: "fail", data: {message}}` for client and
//! auth errors, and `{status: "error", message, stack}` for unexpected
//! failures, with `stack` null in production.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use crate::config::ServerConfig;
use crate::storage::StorageError;

/// Result alias used by all handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Build the success envelope
pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "status": "success", "data": data }))
}

/// Request failure taxonomy, rendered into the envelope at the handler
/// boundary. Nothing below ever escapes to a framework default page.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input fields (400)
    #[error("{0}")]
    InvalidInput(String),
    /// Duplicate email, deleting an admin (400)
    #[error("{0}")]
    Conflict(String),
    /// Missing, invalid, or expired token (401)
    #[error("{0}")]
    Unauthenticated(String),
    /// Authenticated but not permitted (403)
    #[error("{0}")]
    Forbidden(String),
    /// No such record (404)
    #[error("{0}")]
    NotFound(String),
    /// Unexpected failure (500); `stack` carries the chain outside production
    #[error("{message}")]
    Internal {
        message: String,
        stack: Option<String>,
    },
}

impl ApiError {
    /// Wrap an unexpected failure. Logs the full chain; the response carries
    /// it only outside production.
    pub fn internal(config: &ServerConfig, err: impl Into<anyhow::Error>) -> Self {
        let err = err.into();
        error!("internal error: {:#}", err);
        ApiError::Internal {
            message: err.to_string(),
            stack: (!config.production).then(|| format!("{:?}", err)),
        }
    }

    /// Map an account-store failure into the taxonomy. Handlers that need a
    /// different message for a case (e.g. registration conflicts) match on
    /// the storage error themselves before falling back to this.
    pub fn from_storage(config: &ServerConfig, err: StorageError) -> Self {
        match err {
            StorageError::UserNotFound(_) => ApiError::NotFound("User not found.".to_string()),
            StorageError::DuplicateEmail(_) => {
                ApiError::Conflict("Email already exists.".to_string())
            }
            other => ApiError::internal(config, other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidInput(message) | ApiError::Conflict(message) => {
                fail(StatusCode::BAD_REQUEST, &message)
            }
            ApiError::Unauthenticated(message) => fail(StatusCode::UNAUTHORIZED, &message),
            ApiError::Forbidden(message) => fail(StatusCode::FORBIDDEN, &message),
            ApiError::NotFound(message) => fail(StatusCode::NOT_FOUND, &message),
            ApiError::Internal { message, stack } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": message, "stack": stack })),
            )
                .into_response(),
        }
    }
}

fn fail(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "status": "fail", "data": { "message": message } })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_hides_stack_in_production() {
        let mut config = test_config();
        config.production = true;
        let err = ApiError::internal(&config, anyhow::anyhow!("connection refused"));
        match err {
            ApiError::Internal { stack, .. } => assert!(stack.is_none()),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_internal_carries_stack_outside_production() {
        let config = test_config();
        let err = ApiError::internal(&config, anyhow::anyhow!("connection refused"));
        match err {
            ApiError::Internal { message, stack } => {
                assert_eq!(message, "connection refused");
                assert!(stack.is_some());
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    fn test_config() -> ServerConfig {
        ServerConfig {
            port: 3000,
            bind_addr: "127.0.0.1".to_string(),
            database_url: "postgres://localhost/accounts".to_string(),
            token_secret: "0123456789abcdef0123456789abcdef".to_string(),
            production: false,
        }
    }
}
