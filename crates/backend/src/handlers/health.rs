//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use recall_core::db::health_check as db_health_check;
use recall_core::db::schema::missing_tables;
use recall_core::db::DbPool;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Health status ("ok" or "unhealthy")
    pub status: String,
}

/// Detailed health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiHealthResponse {
    pub status: String,

    /// Database connectivity status
    pub database: String,

    /// Required tables absent from the database
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub missing_tables: Vec<String>,

    pub uptime_seconds: u64,
    pub version: String,
}

/// Database state reported by `/api/health`.
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseStatus {
    Connected,
    Disconnected,

    /// Required tables are missing
    IncompleteSchema(Vec<String>),

    /// The catalog lookup for required tables failed
    SchemaUnknown,
}

impl DatabaseStatus {
    async fn probe(pool: &DbPool) -> Self {
        if !db_health_check(pool).await {
            return DatabaseStatus::Disconnected;
        }
        Self::from_missing_tables(missing_tables(pool).await)
    }

    fn from_missing_tables<E: std::fmt::Display>(missing: Result<Vec<String>, E>) -> Self {
        match missing {
            Ok(missing) if missing.is_empty() => DatabaseStatus::Connected,
            Ok(missing) => DatabaseStatus::IncompleteSchema(missing),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list database tables");
                DatabaseStatus::SchemaUnknown
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DatabaseStatus::Connected => "connected",
            DatabaseStatus::Disconnected => "disconnected",
            DatabaseStatus::IncompleteSchema(_) => "incomplete_schema",
            DatabaseStatus::SchemaUnknown => "schema_unknown",
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, DatabaseStatus::Connected)
    }
}

/// `GET /health`
///
/// Returns quickly without touching the database, for load balancer checks.
pub async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}

/// `GET /api/health`
///
/// - `200 OK` when the database answers and has every table
/// - `503 Service Unavailable` otherwise, including when the table check fails
pub async fn api_health(State(state): State<AppState>) -> (StatusCode, Json<ApiHealthResponse>) {
    let database = DatabaseStatus::probe(&state.db).await;
    let (status_code, status) = if database.is_healthy() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };
    let label = database.label();
    let missing = match database {
        DatabaseStatus::IncompleteSchema(missing) => missing,
        _ => Vec::new(),
    };

    let response = ApiHealthResponse {
        status: status.to_string(),
        database: label.to_string(),
        missing_tables: missing,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status_code, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await;
        assert_eq!(response.status, "ok");
    }

    #[test]
    fn test_failed_table_check_is_unhealthy() {
        let status = DatabaseStatus::from_missing_tables::<String>(Err("permission denied".to_string()));
        assert_eq!(status, DatabaseStatus::SchemaUnknown);
        assert!(!status.is_healthy());
        assert_eq!(status.label(), "schema_unknown");
    }

    #[test]
    fn test_table_check_results() {
        let status = DatabaseStatus::from_missing_tables::<String>(Ok(Vec::new()));
        assert!(status.is_healthy());
        assert_eq!(status.label(), "connected");

        let status =
            DatabaseStatus::from_missing_tables::<String>(Ok(vec!["content_record".to_string()]));
        assert!(!status.is_healthy());
        assert_eq!(
            status,
            DatabaseStatus::IncompleteSchema(vec!["content_record".to_string()])
        );
    }
}
