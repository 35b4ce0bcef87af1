//! Provider integrations.
//!
//! Each provider implements [`ContentSource`]: `list` reports the objects a
//! token can see (one page of them, resuming from the saved cursor) and
//! `extract` turns one object into [`ContentRecord`](crate::db::models::ContentRecord)s.

pub mod gdrive;
pub mod kind;
pub mod notion;
pub mod slack;
pub mod source;
pub mod text;

pub use kind::IntegrationKind;
pub use source::{ContentSource, Credentials, ExtractRequest, Listing, SourceRegistry};

use crate::error::{CoreError, CoreResult};

/// Read a JSON body, turning non-success statuses into provider errors.
pub(crate) async fn json_body(
    provider: &str,
    response: reqwest::Response,
) -> CoreResult<serde_json::Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CoreError::provider(
            provider,
            format!("HTTP {}: {}", status, body),
        ));
    }
    Ok(response.json().await?)
}

/// Read a raw body, turning non-success statuses into provider errors.
pub(crate) async fn bytes_body(provider: &str, response: reqwest::Response) -> CoreResult<Vec<u8>> {
    let status = response.status();
    if !status.is_success() {
        return Err(CoreError::provider(provider, format!("HTTP {}", status)));
    }
    Ok(response.bytes().await?.to_vec())
}
