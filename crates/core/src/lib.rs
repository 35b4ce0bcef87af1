//! Recall Core Library
//!
//! Shared code for the Recall services (backend, scheduler, indexer):
//!
//! - **Data model**: Slack users, integrations, content stores and records
//! - **Persistence**: PostgreSQL access through SQLx
//! - **Token encryption**: AES-GCM sealing of provider tokens at rest
//! - **Integrations**: Notion, Google Drive and Slack listing and extraction
//! - **Index jobs**: the queue message format and NATS JetStream plumbing
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from environment variables
//! - [`crypto`]: Token encryption
//! - [`db`]: Database connectivity, schema, models and queries
//! - [`error`]: Error types shared by every service
//! - [`integration`]: Provider readers
//! - [`jobs`]: Index job messages, publishers and subscribers
//!
//! ## Example
//!
//! ```ignore
//! use recall_core::{config::DatabaseConfig, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db_config = DatabaseConfig::from_env()?;
//!     let pool = db::create_pool(&db_config).await?;
//!     db::ensure_schema(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod integration;
pub mod jobs;
pub mod result_ext;

pub use error::{CoreError, CoreResult};
pub use result_ext::ResultExt;
