//! Content store queries.

use chrono::{DateTime, Utc};

use crate::db::models::{ContentStore, ContentStoreDraft, ContentStoreUpdate};
use crate::db::DbPool;
use crate::error::CoreResult;

const CONTENT_STORE_COLUMNS: &str = "id, team_id, type, source_id, user_ids, name, url, \
     source_last_updated, num_vectors, created, updated, is_boosted";

/// Get the content stores for a set of source ids.
pub async fn get_content_stores(
    pool: &DbPool,
    source_ids: &[String],
) -> CoreResult<Vec<ContentStore>> {
    if source_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {} FROM content_store WHERE source_id = ANY($1)",
        CONTENT_STORE_COLUMNS
    );
    let stores = sqlx::query_as::<_, ContentStore>(&sql)
        .bind(source_ids)
        .fetch_all(pool)
        .await?;

    Ok(stores)
}

/// Get one content store by source id.
pub async fn get_content_store(
    pool: &DbPool,
    source_id: &str,
) -> CoreResult<Option<ContentStore>> {
    let sql = format!(
        "SELECT {} FROM content_store WHERE source_id = $1",
        CONTENT_STORE_COLUMNS
    );
    let store = sqlx::query_as::<_, ContentStore>(&sql)
        .bind(source_id)
        .fetch_optional(pool)
        .await?;

    Ok(store)
}

/// Insert a content store from a provider listing.
pub async fn create_content_store(pool: &DbPool, draft: &ContentStoreDraft) -> CoreResult<i64> {
    let result: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO content_store (team_id, type, source_id, user_ids, name, url, source_last_updated)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(&draft.team_id)
    .bind(&draft.content_type)
    .bind(&draft.source_id)
    .bind(draft.initial_user_ids())
    .bind(&draft.name)
    .bind(&draft.url)
    .bind(draft.source_last_updated)
    .fetch_one(pool)
    .await?;

    Ok(result.0)
}

/// Rewrite the listing fields of a content store.
pub async fn update_content_store(
    pool: &DbPool,
    source_id: &str,
    update: &ContentStoreUpdate,
) -> CoreResult<()> {
    sqlx::query(
        r#"
        UPDATE content_store
        SET name = $2, url = $3, source_last_updated = $4, user_ids = $5, updated = NOW()
        WHERE source_id = $1
        "#,
    )
    .bind(source_id)
    .bind(&update.name)
    .bind(&update.url)
    .bind(update.source_last_updated)
    .bind(&update.user_ids)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record how many text records the indexer produced for a source.
pub async fn set_num_vectors(pool: &DbPool, source_id: &str, num_vectors: i32) -> CoreResult<()> {
    sqlx::query(
        r#"
        UPDATE content_store
        SET num_vectors = $2, updated = NOW()
        WHERE source_id = $1
        "#,
    )
    .bind(source_id)
    .bind(num_vectors)
    .execute(pool)
    .await?;

    Ok(())
}

/// Non-boosted content stores of a team and type not updated since `older_than`.
pub async fn get_stale_content_stores(
    pool: &DbPool,
    team_id: &str,
    content_type: &str,
    older_than: DateTime<Utc>,
) -> CoreResult<Vec<ContentStore>> {
    let sql = format!(
        r#"
        SELECT {} FROM content_store
        WHERE team_id = $1
          AND type = $2
          AND source_last_updated < $3
          AND is_boosted = false
        "#,
        CONTENT_STORE_COLUMNS
    );
    let stores = sqlx::query_as::<_, ContentStore>(&sql)
        .bind(team_id)
        .bind(content_type)
        .bind(older_than)
        .fetch_all(pool)
        .await?;

    Ok(stores)
}

/// Delete content stores by source id.
pub async fn delete_content_stores(pool: &DbPool, source_ids: &[String]) -> CoreResult<u64> {
    if source_ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("DELETE FROM content_store WHERE source_id = ANY($1)")
        .bind(source_ids)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
