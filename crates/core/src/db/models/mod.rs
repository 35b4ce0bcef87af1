//! Database models.
//!
//! SQLx row types for every table, plus the insert/update payloads the
//! query functions take.

pub mod content_record;
pub mod content_store;
pub mod integration;
pub mod slack_user;

pub use content_record::*;
pub use content_store::*;
pub use integration::*;
pub use slack_user::*;
