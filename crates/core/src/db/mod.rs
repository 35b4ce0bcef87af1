//! Database module.
//!
//! Connectivity, schema bootstrap, models and queries for the shared
//! PostgreSQL instance, using SQLx.

pub mod models;
pub mod pool;
pub mod queries;
pub mod schema;

pub use pool::{create_pool, health_check, DbPool};
pub use schema::ensure_schema;
