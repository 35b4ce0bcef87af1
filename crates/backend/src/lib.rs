//! Recall backend.
//!
//! Receives Slack Events API callbacks and serves health checks.

pub mod config;
pub mod error;
pub mod handlers;
pub mod signature;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::api_health))
        .route("/slack/events", post(handlers::slack::events))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::BackendConfig;

    const SECRET: &str = "test-signing-secret";

    fn app() -> Router {
        // Lazy pool: routes under test never touch the database.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost:5432/app")
            .unwrap();
        let config = BackendConfig {
            host: "127.0.0.1".to_string(),
            workers: 1,
            port: 3000,
            slack_signing_secret: SECRET.to_string(),
            slack_bot_token: None,
        };
        build_router(AppState::new(pool, config, None, Some("UBOT".to_string())))
    }

    fn signed(body: &'static str) -> Request<Body> {
        let ts = chrono::Utc::now().timestamp().to_string();
        Request::post("/slack/events")
            .header(signature::TIMESTAMP_HEADER, &ts)
            .header(signature::SIGNATURE_HEADER, signature::sign(SECRET, &ts, body.as_bytes()))
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_url_verification_echoes_challenge() {
        let response = app()
            .oneshot(signed(r#"{"type":"url_verification","challenge":"abc123"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["challenge"], "abc123");
    }

    #[tokio::test]
    async fn test_unsigned_request_is_rejected() {
        let request = Request::post("/slack/events")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"type":"url_verification","challenge":"abc123"}"#))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_event_for_other_user_joining_is_ignored() {
        let response = app()
            .oneshot(signed(
                r#"{"type":"event_callback","team_id":"T1","event":{"type":"member_joined_channel","user":"U5","inviter":"U9"}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = app().oneshot(signed("not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
