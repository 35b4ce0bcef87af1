//! Recall indexer.
//!
//! Consumes index jobs from NATS, extracts text through the provider
//! readers and keeps `content_record` in step with each source.

pub mod config;
pub mod handler;
pub mod worker;

pub use config::IndexerConfig;
pub use handler::{JobHandler, JobOutcome};
pub use worker::Worker;
