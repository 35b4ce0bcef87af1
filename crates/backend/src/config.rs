//! Backend configuration.

use serde::Deserialize;

/// Backend settings.
///
/// - `BACKEND_HOST`: bind address (default: "0.0.0.0")
/// - `BACKEND_WORKERS`: tokio worker threads (default: 3)
/// - `PORT`: listen port (default: 3000)
/// - `SLACK_SIGNING_SECRET`: secret used to verify Slack requests (required)
/// - `SLACK_BOT_TOKEN`: optional bot token for workspace lookups
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub host: String,
    pub workers: usize,
    pub port: u16,
    pub slack_signing_secret: String,
    pub slack_bot_token: Option<String>,
}

#[derive(Deserialize)]
struct ServerVars {
    #[serde(default = "default_host")]
    host: String,

    #[serde(default = "default_workers")]
    workers: usize,
}

#[derive(Deserialize)]
struct SharedVars {
    #[serde(default = "default_port")]
    port: u16,

    slack_signing_secret: String,

    #[serde(default)]
    slack_bot_token: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_workers() -> usize {
    3
}

fn default_port() -> u16 {
    3000
}

impl BackendConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, envy::Error> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let server: ServerVars = envy::prefixed("BACKEND_").from_iter(vars.clone())?;
        let shared: SharedVars = envy::from_iter(vars)?;

        Ok(Self {
            host: server.host,
            workers: server.workers.max(1),
            port: shared.port,
            slack_signing_secret: shared.slack_signing_secret,
            slack_bot_token: shared.slack_bot_token.filter(|t| !t.is_empty()),
        })
    }

    /// Address suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
