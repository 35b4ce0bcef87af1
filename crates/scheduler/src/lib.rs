//! Recall scheduler.
//!
//! Periodically lists the content every integration can see, records new
//! and changed sources in `content_store`, prunes sources that went stale
//! and queues index jobs for the indexer.

pub mod config;
pub mod plan;
pub mod sync;

pub use config::SchedulerConfig;
pub use sync::{CycleJobs, CycleReport, Scheduler, SyncRequest};
