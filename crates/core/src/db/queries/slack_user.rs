//! Slack user queries.

use crate::db::models::{NewSlackUser, SlackUser};
use crate::db::DbPool;
use crate::error::CoreResult;

/// Get a Slack user by team and user id.
pub async fn get_slack_user(
    pool: &DbPool,
    team_id: &str,
    user_id: &str,
) -> CoreResult<Option<SlackUser>> {
    let user = sqlx::query_as::<_, SlackUser>(
        r#"
        SELECT id, user_id, team_name, team_id, created, updated, onboarded
        FROM slack_user
        WHERE team_id = $1 AND user_id = $2
        "#,
    )
    .bind(team_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Register a Slack user.
///
/// Returns `None` when the user already exists.
pub async fn create_slack_user(pool: &DbPool, user: &NewSlackUser) -> CoreResult<Option<i64>> {
    let id: Option<(i64,)> = sqlx::query_as(
        r#"
        INSERT INTO slack_user (user_id, team_name, team_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (team_id, user_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&user.user_id)
    .bind(&user.team_name)
    .bind(&user.team_id)
    .fetch_optional(pool)
    .await?;

    Ok(id.map(|(id,)| id))
}

/// Set the onboarding flag of a Slack user.
pub async fn set_slack_user_onboarded(pool: &DbPool, id: i64, onboarded: bool) -> CoreResult<()> {
    sqlx::query(
        r#"
        UPDATE slack_user
        SET onboarded = $2, updated = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(onboarded)
    .execute(pool)
    .await?;

    Ok(())
}
