//! Content store model.
//!
//! A content store is one object listed from a provider (a Notion page, a
//! Drive file, a Slack channel). The scheduler keeps the table in step with
//! the providers and the indexer records how many text records each row
//! produced in `num_vectors`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Content store row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ContentStore {
    pub id: i64,
    pub team_id: String,

    /// Content type, e.g. `notion` or `drive#file|application/pdf`
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub content_type: String,

    /// Provider identifier, unique across the table
    pub source_id: String,

    /// Users known to have access to the source
    pub user_ids: Vec<String>,

    pub name: String,
    pub url: String,
    pub source_last_updated: Option<DateTime<Utc>>,

    /// Number of records the indexer produced for this source
    pub num_vectors: i32,

    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,

    /// Boosted sources are never pruned
    pub is_boosted: bool,
}

/// A content store as reported by a provider listing.
///
/// This is also the payload of an upsert index job, so it carries
/// everything the indexer needs to extract the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStoreDraft {
    pub team_id: String,

    /// User the listing was made for (none for workspace-wide sources)
    #[serde(default)]
    pub user_id: Option<String>,

    pub url: String,

    #[serde(rename = "type")]
    pub content_type: String,

    pub name: String,
    pub source_id: String,

    #[serde(default)]
    pub source_last_updated: Option<DateTime<Utc>>,
}

impl ContentStoreDraft {
    /// User ids to store for a newly inserted row.
    pub fn initial_user_ids(&self) -> Vec<String> {
        self.user_id.iter().cloned().collect()
    }
}

/// Fields rewritten when a source changed upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentStoreUpdate {
    pub name: String,
    pub url: String,
    pub source_last_updated: Option<DateTime<Utc>>,
    pub user_ids: Vec<String>,
}
