//! Index jobs.
//!
//! The scheduler publishes jobs; indexers consume them. Jobs travel as JSON
//! over a NATS JetStream subject.

pub mod nats;

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::ContentStoreDraft;
use crate::error::{CoreError, CoreResult};

pub use nats::{JobSubscriber, NatsJobQueue};

/// Jobs are published in batches of this size; each batch is acknowledged before the next.
pub const PUBLISH_BATCH_SIZE: usize = 10;

/// A unit of indexing work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndexJob {
    /// Extract a content store and replace its records.
    Upsert {
        integration_id: i64,
        content_store: ContentStoreDraft,
        #[serde(default)]
        initial_index: bool,

        /// Stored `source_last_updated` before this sync, for incremental reads
        #[serde(default)]
        since: Option<DateTime<Utc>>,
    },

    /// Remove every record of the given sources.
    Delete {
        team_id: String,
        source_ids: Vec<String>,
    },
}

impl IndexJob {
    pub fn to_payload(&self) -> CoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_payload(payload: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            IndexJob::Upsert { .. } => "upsert",
            IndexJob::Delete { .. } => "delete",
        }
    }
}

/// Destination for index jobs.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Publish jobs, returning once the queue has accepted all of them.
    async fn publish(&self, jobs: &[IndexJob]) -> CoreResult<()>;
}

/// In-process queue that keeps published jobs, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryJobQueue {
    jobs: Mutex<Vec<IndexJob>>,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything published so far.
    pub fn drain(&self) -> Vec<IndexJob> {
        match self.jobs.lock() {
            Ok(mut jobs) => std::mem::take(&mut *jobs),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn publish(&self, jobs: &[IndexJob]) -> CoreResult<()> {
        self.jobs
            .lock()
            .map_err(|e| CoreError::Queue(e.to_string()))?
            .extend_from_slice(jobs);
        Ok(())
    }
}
