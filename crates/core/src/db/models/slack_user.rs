//! Slack user model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A Slack user who has opened the bot at least once.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SlackUser {
    pub id: i64,
    pub user_id: String,
    pub team_name: String,
    pub team_id: String,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
    pub onboarded: bool,
}

/// Fields for registering a Slack user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSlackUser {
    pub user_id: String,
    pub team_name: String,
    pub team_id: String,
}
