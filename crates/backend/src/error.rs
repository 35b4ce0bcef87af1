//! Error types for the backend.
//!
//! Errors implement `IntoResponse` so handlers can return them directly.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recall_core::CoreError;
use serde_json::json;
use thiserror::Error;

/// Backend errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request failed Slack signature verification
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request error
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Error from the core library
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Unauthorized(msg) => {
                tracing::warn!(error = %msg, "Rejected Slack request");
                (StatusCode::UNAUTHORIZED, msg.clone())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Core(CoreError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, msg.clone())
            }
            AppError::Core(e @ CoreError::Provider { .. }) | AppError::Core(e @ CoreError::Http(_)) => {
                tracing::warn!(error = %e, "External service error");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            AppError::Core(e) => {
                tracing::error!(error = %e, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Core(CoreError::Database(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Unauthorized("bad signature".into()), StatusCode::UNAUTHORIZED),
            (AppError::BadRequest("no body".into()), StatusCode::BAD_REQUEST),
            (
                AppError::Core(CoreError::provider("slack", "ratelimited")),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::Core(CoreError::Queue("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_core_errors_are_transparent() {
        let err = AppError::from(CoreError::NotFound("Slack user".into()));
        assert_eq!(err.to_string(), "Resource not found: Slack user");
    }
}
