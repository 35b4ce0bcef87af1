//! Notion pages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::db::models::{ContentRecord, ContentStoreDraft};
use crate::error::CoreResult;

use super::kind::{IntegrationKind, NOTION_PAGE};
use super::source::{ContentSource, Credentials, ExtractRequest, Listing};
use super::text;
use super::json_body;

const NOTION_API: &str = "https://api.notion.com";
const NOTION_VERSION: &str = "2021-08-16";
const PAGE_SIZE: u32 = 100;

/// Block types whose text forms the page body.
const BODY_BLOCKS: &[&str] = &["paragraph", "callout"];

/// Block types collected after the body.
const TRAILING_BLOCKS: &[&str] = &[
    "to_do",
    "bulleted_list_item",
    "numbered_list_item",
    "quote",
    "heading_1",
    "heading_2",
    "heading_3",
];

pub struct NotionSource {
    http: reqwest::Client,
    base_url: String,
}

impl NotionSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, NOTION_API)
    }

    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn search(&self, token: &str, cursor: Option<&str>) -> CoreResult<Value> {
        let mut body = json!({
            "sort": { "direction": "descending", "timestamp": "last_edited_time" },
            "filter": { "property": "object", "value": "page" },
            "page_size": PAGE_SIZE,
        });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }

        let response = self
            .http
            .post(format!("{}/v1/search", self.base_url))
            .bearer_auth(token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await?;
        json_body("notion", response).await
    }

    async fn block_children(&self, token: &str, page_id: &str) -> CoreResult<Vec<Value>> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(format!("{}/v1/blocks/{}/children", self.base_url, page_id))
                .bearer_auth(token)
                .header("Notion-Version", NOTION_VERSION)
                .query(&[("page_size", PAGE_SIZE.to_string())]);
            if let Some(cursor) = &cursor {
                request = request.query(&[("start_cursor", cursor)]);
            }

            let page = json_body("notion", request.send().await?).await?;
            if let Some(results) = page["results"].as_array() {
                blocks.extend(results.iter().cloned());
            }

            cursor = next_cursor(&page);
            if cursor.is_none() {
                break;
            }
        }

        Ok(blocks)
    }
}

#[async_trait]
impl ContentSource for NotionSource {
    fn kind(&self) -> IntegrationKind {
        IntegrationKind::Notion
    }

    async fn list(&self, credentials: &Credentials) -> CoreResult<Listing> {
        let page = self
            .search(&credentials.token, credentials.last_cursor.as_deref())
            .await?;
        Ok(parse_search(&page, credentials))
    }

    async fn extract(
        &self,
        credentials: &Credentials,
        request: &ExtractRequest,
    ) -> CoreResult<Vec<ContentRecord>> {
        let draft = &request.content_store;
        if draft.content_type != NOTION_PAGE {
            return Ok(Vec::new());
        }

        let blocks = match self.block_children(&credentials.token, &draft.source_id).await {
            Ok(blocks) => blocks,
            Err(e) => {
                tracing::warn!(page_id = %draft.source_id, error = %e, "Failed to read Notion page");
                return Ok(Vec::new());
            }
        };
        Ok(text::document_records(draft, &page_text(&blocks)))
    }
}

fn next_cursor(page: &Value) -> Option<String> {
    page["next_cursor"].as_str().map(str::to_string)
}

/// Page name derived from the URL slug, `Untitled` when the slug is only the id.
pub fn page_name(url: &str) -> String {
    let slug = url.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    let words: Vec<&str> = slug.split('-').collect();
    if words.len() <= 1 {
        return "Untitled".to_string();
    }
    words[..words.len() - 1].join(" ")
}

/// Turn a search response into drafts, skipping archived pages.
pub fn parse_search(page: &Value, credentials: &Credentials) -> Listing {
    let content_stores = page["results"]
        .as_array()
        .map(|results| {
            results
                .iter()
                .filter(|result| !result["archived"].as_bool().unwrap_or(false))
                .filter_map(|result| {
                    let id = result["id"].as_str()?;
                    let url = result["url"].as_str()?;
                    Some(ContentStoreDraft {
                        team_id: credentials.team_id.clone(),
                        user_id: credentials.user_id.clone(),
                        url: url.to_string(),
                        content_type: NOTION_PAGE.to_string(),
                        name: page_name(url),
                        source_id: id.to_string(),
                        source_last_updated: result["last_edited_time"]
                            .as_str()
                            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                            .map(|t| t.with_timezone(&Utc)),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Listing {
        cursor: next_cursor(page),
        content_stores,
    }
}

fn rich_text(block_type: &str, block: &Value) -> Option<String> {
    let Some(snippets) = block
        .get("rich_text")
        .or_else(|| block.get("text"))
        .and_then(Value::as_array)
    else {
        tracing::debug!(block_type = %block_type, "Skipping block without text");
        return None;
    };

    Some(
        snippets
            .iter()
            .filter_map(|s| s["text"]["content"].as_str().or_else(|| s["plain_text"].as_str()))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Normalized text of a page's blocks.
///
/// Paragraphs and callouts come first in document order, followed by list
/// items, quotes and headings.
pub fn page_text(blocks: &[Value]) -> String {
    let mut body = Vec::new();
    let mut trailing = Vec::new();

    for block in blocks {
        let Some(block_type) = block["type"].as_str() else {
            continue;
        };
        let content = &block[block_type];
        if BODY_BLOCKS.contains(&block_type) {
            body.extend(rich_text(block_type, content));
        } else if TRAILING_BLOCKS.contains(&block_type) {
            trailing.extend(rich_text(block_type, content));
        }
    }

    body.push(trailing.join(" "));
    text::normalize(&body.join(" "))
}
