//! Integration model.
//!
//! Integration tokens are stored encrypted at rest using AES-GCM.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::integration::IntegrationKind;

/// Integration row with the sealed token.
#[derive(Debug, Clone, FromRow)]
pub struct Integration {
    pub id: i64,
    pub team_id: String,

    /// Provider type (`notion`, `gdrive`, `slack`)
    #[sqlx(rename = "type")]
    pub kind: String,

    /// Encrypted provider token
    pub token: Vec<u8>,

    pub user_id: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,

    /// Provider paging cursor saved by the previous scheduler cycle
    pub last_cursor: Option<String>,

    pub extra: Option<String>,
}

impl Integration {
    /// Parsed provider kind, `None` for types this build does not know.
    pub fn integration_kind(&self) -> Option<IntegrationKind> {
        self.kind.parse().ok()
    }
}

/// Fields for storing a new integration. The token is sealed by the caller.
#[derive(Debug, Clone)]
pub struct NewIntegration {
    pub team_id: String,
    pub kind: IntegrationKind,
    pub token: Vec<u8>,
    pub user_id: Option<String>,
    pub extra: Option<String>,
}
