//! Extracted text records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Record text type for sentence chunks and Slack messages.
pub const TEXT_TYPE_CONTENT: &str = "content";

/// Record text type for the document title.
pub const TEXT_TYPE_TITLE: &str = "title";

/// One unit of extracted text.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub source_id: String,
    pub team_id: String,
    pub user_id: Option<String>,
    pub text: String,
    pub text_type: String,
    pub source_type: String,
    pub source_name: String,
    pub url: String,
    pub last_updated: Option<DateTime<Utc>>,
}
