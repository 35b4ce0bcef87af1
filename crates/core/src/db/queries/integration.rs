//! Integration queries.

use crate::db::models::{Integration, NewIntegration};
use crate::db::DbPool;
use crate::error::CoreResult;

const INTEGRATION_COLUMNS: &str =
    "id, team_id, type, token, user_id, created, updated, last_cursor, extra";

/// All integrations, least recently synced first.
pub async fn get_all_integrations(pool: &DbPool) -> CoreResult<Vec<Integration>> {
    let sql = format!(
        "SELECT {} FROM integration ORDER BY updated ASC NULLS FIRST, id ASC",
        INTEGRATION_COLUMNS
    );
    let integrations = sqlx::query_as::<_, Integration>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(integrations)
}

/// Get an integration by id.
pub async fn get_integration(pool: &DbPool, id: i64) -> CoreResult<Option<Integration>> {
    let sql = format!("SELECT {} FROM integration WHERE id = $1", INTEGRATION_COLUMNS);
    let integration = sqlx::query_as::<_, Integration>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(integration)
}

/// All integrations of one user.
pub async fn get_user_integrations(
    pool: &DbPool,
    team_id: &str,
    user_id: &str,
) -> CoreResult<Vec<Integration>> {
    let sql = format!(
        "SELECT {} FROM integration WHERE team_id = $1 AND user_id = $2 ORDER BY id ASC",
        INTEGRATION_COLUMNS
    );
    let integrations = sqlx::query_as::<_, Integration>(&sql)
        .bind(team_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(integrations)
}

/// A user's integration of one provider type.
pub async fn get_user_integration(
    pool: &DbPool,
    team_id: &str,
    user_id: &str,
    kind: &str,
) -> CoreResult<Option<Integration>> {
    let sql = format!(
        "SELECT {} FROM integration WHERE team_id = $1 AND user_id = $2 AND type = $3",
        INTEGRATION_COLUMNS
    );
    let integration = sqlx::query_as::<_, Integration>(&sql)
        .bind(team_id)
        .bind(user_id)
        .bind(kind)
        .fetch_optional(pool)
        .await?;

    Ok(integration)
}

/// Insert an integration.
pub async fn create_integration(pool: &DbPool, integration: &NewIntegration) -> CoreResult<i64> {
    let result: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO integration (team_id, type, token, user_id, extra)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&integration.team_id)
    .bind(integration.kind.as_str())
    .bind(&integration.token)
    .bind(&integration.user_id)
    .bind(&integration.extra)
    .fetch_one(pool)
    .await?;

    Ok(result.0)
}

/// Save the paging cursor after a listing; also marks the integration synced.
pub async fn update_integration_cursor(
    pool: &DbPool,
    id: i64,
    cursor: Option<&str>,
) -> CoreResult<()> {
    sqlx::query(
        r#"
        UPDATE integration
        SET last_cursor = $2, updated = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(cursor)
    .execute(pool)
    .await?;

    Ok(())
}
