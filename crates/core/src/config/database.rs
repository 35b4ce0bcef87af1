//! Database configuration for the shared PostgreSQL instance.

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

/// Database configuration loaded from environment variables.
///
/// Environment variables are prefixed with `POSTGRES_`:
/// - `POSTGRES_HOST`: Database host (default: "localhost")
/// - `POSTGRES_PORT`: Database port (default: "5432")
/// - `POSTGRES_USER`: Database user (default: "postgres")
/// - `POSTGRES_PASSWORD`: Database password
/// - `POSTGRES_DB`: Database name (default: "app")
/// - `POSTGRES_MAX_CONNECTIONS` / `POSTGRES_MIN_CONNECTIONS`: pool bounds
/// - `POSTGRES_ACQUIRE_TIMEOUT`: seconds to wait for a connection
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database host
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database user
    #[serde(default = "default_user")]
    pub user: String,

    /// Database password
    #[serde(default)]
    pub password: String,

    /// Database name
    #[serde(default = "default_database")]
    pub db: String,

    /// Maximum connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_database() -> String {
    "app".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout() -> u64 {
    30
}

impl DatabaseConfig {
    /// Load configuration from `POSTGRES_*` environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("POSTGRES_").from_env::<DatabaseConfig>()
    }

    /// Connection options for the pool. The password is only set when present
    /// so local trust auth keeps working.
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.db);
        if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            db: default_database(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout: default_acquire_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DatabaseConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.db, "app");
    }

    #[test]
    fn test_connect_options_use_configured_target() {
        let config = DatabaseConfig {
            host: "db".to_string(),
            port: 6543,
            ..DatabaseConfig::default()
        };
        let options = config.connect_options();
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("app"));
    }

    #[test]
    fn test_from_iter_reads_db_name() {
        let vars = vec![
            ("POSTGRES_HOST".to_string(), "db".to_string()),
            ("POSTGRES_DB".to_string(), "recall".to_string()),
            ("POSTGRES_USER".to_string(), "recall".to_string()),
        ];
        let config: DatabaseConfig = envy::prefixed("POSTGRES_").from_iter(vars).unwrap();
        assert_eq!(config.host, "db");
        assert_eq!(config.db, "recall");
        assert_eq!(config.port, 5432);
        assert_eq!(config.max_connections, 10);
    }
}
