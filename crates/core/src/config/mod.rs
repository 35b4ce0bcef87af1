//! Configuration shared by the Recall services.
//!
//! Every struct is loaded from environment variables with `envy`; binaries
//! call `dotenvy::dotenv()` first so a local `.env` file is honoured.

mod database;
mod provider;
mod queue;

pub use database::DatabaseConfig;
pub use provider::ProviderConfig;
pub use queue::QueueConfig;

/// Development key for token encryption (32 zero bytes).
const DEFAULT_ENCRYPTION_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

/// Base64 key used to seal integration tokens, from `TOKEN_SEC_KEY`.
pub fn encryption_key() -> String {
    std::env::var("TOKEN_SEC_KEY").unwrap_or_else(|_| {
        tracing::warn!("TOKEN_SEC_KEY not set, using default (not secure for production)");
        DEFAULT_ENCRYPTION_KEY.to_string()
    })
}
