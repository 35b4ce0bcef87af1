//! Schema bootstrap.
//!
//! Every service runs [`ensure_schema`] at startup; the statements are
//! idempotent so concurrent starts are harmless.

use crate::db::DbPool;
use crate::error::CoreResult;

/// Tables every service expects to find.
pub const REQUIRED_TABLES: [&str; 4] = [
    "slack_user",
    "content_store",
    "integration",
    "content_record",
];

const SCHEMA_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS slack_user (
    id BIGSERIAL PRIMARY KEY,
    user_id TEXT NOT NULL,
    team_name TEXT NOT NULL,
    team_id TEXT NOT NULL,
    created TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated TIMESTAMPTZ,
    onboarded BOOLEAN NOT NULL DEFAULT false,
    UNIQUE (team_id, user_id)
);

CREATE TABLE IF NOT EXISTS content_store (
    id BIGSERIAL PRIMARY KEY,
    team_id TEXT NOT NULL,
    type TEXT NOT NULL,
    source_id TEXT NOT NULL UNIQUE,
    user_ids TEXT[] NOT NULL DEFAULT '{}',
    name TEXT NOT NULL,
    url TEXT NOT NULL,
    source_last_updated TIMESTAMPTZ,
    num_vectors INTEGER NOT NULL DEFAULT 0,
    created TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated TIMESTAMPTZ,
    is_boosted BOOLEAN NOT NULL DEFAULT false
);

CREATE INDEX IF NOT EXISTS ix_content_store_team_type
    ON content_store (team_id, type, source_last_updated);

CREATE TABLE IF NOT EXISTS integration (
    id BIGSERIAL PRIMARY KEY,
    team_id TEXT NOT NULL,
    type TEXT NOT NULL,
    token BYTEA NOT NULL,
    user_id TEXT,
    created TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated TIMESTAMPTZ,
    last_cursor TEXT,
    extra TEXT
);

CREATE INDEX IF NOT EXISTS ix_integration_team_user
    ON integration (team_id, user_id, type);

CREATE TABLE IF NOT EXISTS content_record (
    id TEXT PRIMARY KEY,
    source_id TEXT NOT NULL,
    team_id TEXT NOT NULL,
    user_id TEXT,
    text TEXT NOT NULL,
    text_type TEXT NOT NULL,
    source_type TEXT NOT NULL,
    source_name TEXT NOT NULL,
    url TEXT NOT NULL,
    last_updated TIMESTAMPTZ,
    created TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS ix_content_record_source
    ON content_record (source_id);
"#;

/// Create any missing tables and indexes.
pub async fn ensure_schema(pool: &DbPool) -> CoreResult<()> {
    sqlx::raw_sql(SCHEMA_DDL).execute(pool).await?;
    tracing::info!(tables = ?REQUIRED_TABLES, "Database schema ensured");
    Ok(())
}

/// List required tables that are missing from the `public` schema.
pub async fn missing_tables(pool: &DbPool) -> CoreResult<Vec<String>> {
    let existing: Vec<String> = sqlx::query_scalar(
        "SELECT table_name::text FROM information_schema.tables WHERE table_schema = 'public'",
    )
    .fetch_all(pool)
    .await?;

    Ok(REQUIRED_TABLES
        .iter()
        .filter(|t| !existing.iter().any(|e| e == *t))
        .map(|t| t.to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddl_covers_required_tables() {
        for table in REQUIRED_TABLES {
            assert!(
                SCHEMA_DDL.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "missing DDL for {}",
                table
            );
        }
    }

    #[test]
    fn test_source_id_is_unique() {
        assert!(SCHEMA_DDL.contains("source_id TEXT NOT NULL UNIQUE"));
    }
}
