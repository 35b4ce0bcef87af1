//! NATS JetStream settings for the index job queue.

use serde::Deserialize;

/// Queue configuration, prefixed with `NATS_`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// NATS server URL
    #[serde(default = "default_url")]
    pub url: String,

    /// JetStream stream name
    #[serde(default = "default_stream")]
    pub stream: String,

    /// Subject index jobs are published on
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Durable consumer name used by indexers
    #[serde(default = "default_consumer")]
    pub consumer: String,
}

fn default_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_stream() -> String {
    "recall_index_jobs".to_string()
}

fn default_subject() -> String {
    "recall.index".to_string()
}

fn default_consumer() -> String {
    "indexer".to_string()
}

impl QueueConfig {
    /// Load configuration from `NATS_*` environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("NATS_").from_env::<QueueConfig>()
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            stream: default_stream(),
            subject: default_subject(),
            consumer: default_consumer(),
        }
    }
}
