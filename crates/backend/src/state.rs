//! Shared application state passed to handlers via Axum's state management.

use std::sync::Arc;

use recall_core::db::DbPool;
use recall_core::integration::slack::SlackClient;

use crate::config::BackendConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<BackendConfig>,

    /// Bot client, present when `SLACK_BOT_TOKEN` is configured
    pub slack: Option<SlackClient>,

    /// The bot's own user id, used to recognise the bot joining a channel
    pub bot_user_id: Option<String>,

    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        db: DbPool,
        config: BackendConfig,
        slack: Option<SlackClient>,
        bot_user_id: Option<String>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            slack,
            bot_user_id,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
