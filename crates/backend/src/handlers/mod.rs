//! HTTP handlers.

pub mod health;
pub mod slack;

pub use health::{api_health, health_check};
