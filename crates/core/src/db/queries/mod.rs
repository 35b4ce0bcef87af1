//! Database queries, organized by table.

pub mod content_record;
pub mod content_store;
pub mod integration;
pub mod slack_user;
