//! Token encryption.
//!
//! Provider tokens are sealed with AES-256-GCM before they reach the
//! `integration` table.

pub mod encryption;

pub use encryption::Encryptor;
