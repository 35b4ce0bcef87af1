//! Indexer configuration.

use serde::Deserialize;

use recall_core::config::QueueConfig;

/// Indexer settings.
///
/// - `INDEXER_ID`: identifier used in logs (default: random UUID)
/// - `INDEXER_MAX_CONCURRENT`: jobs processed at once (default: 4)
/// - `NATS_*`: see [`QueueConfig`]
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub indexer_id: String,
    pub max_concurrent: usize,
    pub queue: QueueConfig,
}

#[derive(Deserialize)]
struct IndexerVars {
    #[serde(default)]
    id: Option<String>,

    #[serde(default = "default_max_concurrent")]
    max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    4
}

impl IndexerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let indexer: IndexerVars = envy::prefixed("INDEXER_").from_iter(vars.clone())?;
        let queue: QueueConfig = envy::prefixed("NATS_").from_iter(vars)?;

        Ok(Self {
            indexer_id: indexer
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            max_concurrent: indexer.max_concurrent.max(1),
            queue,
        })
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            indexer_id: uuid::Uuid::new_v4().to_string(),
            max_concurrent: default_max_concurrent(),
            queue: QueueConfig::default(),
        }
    }
}
