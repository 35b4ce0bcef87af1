//! Content record queries.

use crate::db::models::ContentRecord;
use crate::db::DbPool;
use crate::error::CoreResult;

/// Insert or replace records, in one transaction.
pub async fn upsert_content_records(pool: &DbPool, records: &[ContentRecord]) -> CoreResult<u64> {
    let mut tx = pool.begin().await?;
    let mut written = 0;

    for record in records {
        let result = sqlx::query(
            r#"
            INSERT INTO content_record
                (id, source_id, team_id, user_id, text, text_type, source_type, source_name, url, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                text = EXCLUDED.text,
                text_type = EXCLUDED.text_type,
                user_id = EXCLUDED.user_id,
                source_type = EXCLUDED.source_type,
                source_name = EXCLUDED.source_name,
                url = EXCLUDED.url,
                last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(&record.id)
        .bind(&record.source_id)
        .bind(&record.team_id)
        .bind(&record.user_id)
        .bind(&record.text)
        .bind(&record.text_type)
        .bind(&record.source_type)
        .bind(&record.source_name)
        .bind(&record.url)
        .bind(record.last_updated)
        .execute(&mut *tx)
        .await?;

        written += result.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}

/// Delete records by id.
pub async fn delete_content_records(pool: &DbPool, ids: &[String]) -> CoreResult<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("DELETE FROM content_record WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Delete every record extracted from the given sources.
pub async fn delete_content_records_for_sources(
    pool: &DbPool,
    source_ids: &[String],
) -> CoreResult<u64> {
    if source_ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("DELETE FROM content_record WHERE source_id = ANY($1)")
        .bind(source_ids)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Number of records stored for a source.
pub async fn count_content_records(pool: &DbPool, source_id: &str) -> CoreResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content_record WHERE source_id = $1")
        .bind(source_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
