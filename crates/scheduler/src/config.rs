//! Scheduler configuration.

use std::time::Duration;

use serde::Deserialize;

/// Scheduler settings, prefixed with `SCHEDULER_`.
///
/// - `SCHEDULER_INTERVAL_SECS`: seconds between cycles (default: 3600)
/// - `SCHEDULER_UPSERT_LIMIT`: upsert jobs queued per cycle (default: 1000)
/// - `SCHEDULER_RETENTION_DAYS`: age after which stale content is pruned (default: 180)
/// - `SCHEDULER_RUN_ONCE`: run a single cycle and exit (default: false)
/// - `SCHEDULER_TEAM_ID` / `SCHEDULER_USER_ID`: restrict the sync to one user
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_upsert_limit")]
    pub upsert_limit: usize,

    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    #[serde(default)]
    pub run_once: bool,

    #[serde(default)]
    pub team_id: Option<String>,

    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_interval_secs() -> u64 {
    3600
}

fn default_upsert_limit() -> usize {
    1000
}

fn default_retention_days() -> i64 {
    180
}

impl SchedulerConfig {
    /// Load configuration from `SCHEDULER_*` environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("SCHEDULER_").from_env::<SchedulerConfig>()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            upsert_limit: default_upsert_limit(),
            retention_days: default_retention_days(),
            run_once: false,
            team_id: None,
            user_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_env() {
        let vars: Vec<(String, String)> = Vec::new();
        let config: SchedulerConfig = envy::prefixed("SCHEDULER_").from_iter(vars).unwrap();
        assert_eq!(config.interval(), Duration::from_secs(3600));
        assert_eq!(config.upsert_limit, 1000);
        assert_eq!(config.retention_days, 180);
        assert!(!config.run_once);
        assert!(config.team_id.is_none());
    }

    #[test]
    fn test_one_shot_for_user() {
        let vars = vec![
            ("SCHEDULER_RUN_ONCE".to_string(), "true".to_string()),
            ("SCHEDULER_TEAM_ID".to_string(), "T1".to_string()),
            ("SCHEDULER_USER_ID".to_string(), "U1".to_string()),
            ("SCHEDULER_UPSERT_LIMIT".to_string(), "50".to_string()),
        ];
        let config: SchedulerConfig = envy::prefixed("SCHEDULER_").from_iter(vars).unwrap();
        assert!(config.run_once);
        assert_eq!(config.team_id.as_deref(), Some("T1"));
        assert_eq!(config.user_id.as_deref(), Some("U1"));
        assert_eq!(config.upsert_limit, 50);
    }
}
