//! Google Drive files and Google Docs.
//!
//! Integrations store a refresh token; every call first trades it for an
//! access token using the OAuth client from [`ProviderConfig`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::db::models::{ContentRecord, ContentStoreDraft};
use crate::error::{CoreError, CoreResult};

use super::kind::{drive_content_type, IntegrationKind, DRIVE_GOOGLE_DOC, DRIVE_PDF, DRIVE_TEXT};
use super::source::{ContentSource, Credentials, ExtractRequest, Listing};
use super::text;
use super::{bytes_body, json_body};

const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DRIVE_API: &str = "https://www.googleapis.com";
const DOCS_API: &str = "https://docs.googleapis.com";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, modifiedTime, mimeType)";

/// Base URLs for the Google endpoints.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub oauth_token: String,
    pub drive: String,
    pub docs: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            oauth_token: OAUTH_TOKEN_URL.to_string(),
            drive: DRIVE_API.to_string(),
            docs: DOCS_API.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

pub struct DriveSource {
    http: reqwest::Client,
    client: Option<(String, String)>,
    endpoints: GoogleEndpoints,
}

impl DriveSource {
    pub fn new(http: reqwest::Client, providers: &ProviderConfig) -> Self {
        Self::with_endpoints(http, providers, GoogleEndpoints::default())
    }

    pub fn with_endpoints(
        http: reqwest::Client,
        providers: &ProviderConfig,
        endpoints: GoogleEndpoints,
    ) -> Self {
        Self {
            http,
            client: providers
                .google_client()
                .map(|(id, secret)| (id.to_string(), secret.to_string())),
            endpoints,
        }
    }

    async fn access_token(&self, refresh_token: &str) -> CoreResult<String> {
        let (client_id, client_secret) = self.client.as_ref().ok_or_else(|| {
            CoreError::Config("CLIENT_ID and CLIENT_SECRET are required for Google Drive".into())
        })?;

        let response = self
            .http
            .post(&self.endpoints.oauth_token)
            .form(&[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let body = json_body("google", response).await?;
        let token: AccessToken = serde_json::from_value(body)?;
        Ok(token.access_token)
    }

    async fn list_files(&self, access_token: &str, page_token: Option<&str>) -> CoreResult<Value> {
        let mut request = self
            .http
            .get(format!("{}/drive/v3/files", self.endpoints.drive))
            .bearer_auth(access_token)
            .query(&[
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
                ("fields", LIST_FIELDS),
                ("orderBy", "modifiedTime desc"),
                ("q", "trashed=false"),
            ]);
        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        json_body("google", request.send().await?).await
    }

    async fn download(&self, access_token: &str, file_id: &str) -> CoreResult<Vec<u8>> {
        let response = self
            .http
            .get(format!("{}/drive/v3/files/{}", self.endpoints.drive, file_id))
            .bearer_auth(access_token)
            .query(&[("alt", "media"), ("supportsAllDrives", "true")])
            .send()
            .await?;
        bytes_body("google", response).await
    }

    async fn document(&self, access_token: &str, document_id: &str) -> CoreResult<Value> {
        let response = self
            .http
            .get(format!("{}/v1/documents/{}", self.endpoints.docs, document_id))
            .bearer_auth(access_token)
            .send()
            .await?;
        json_body("google", response).await
    }
}

#[async_trait]
impl ContentSource for DriveSource {
    fn kind(&self) -> IntegrationKind {
        IntegrationKind::GoogleDrive
    }

    async fn list(&self, credentials: &Credentials) -> CoreResult<Listing> {
        let access_token = self.access_token(&credentials.token).await?;
        let page = self
            .list_files(&access_token, credentials.last_cursor.as_deref())
            .await?;
        Ok(parse_files(&page, credentials))
    }

    async fn extract(
        &self,
        credentials: &Credentials,
        request: &ExtractRequest,
    ) -> CoreResult<Vec<ContentRecord>> {
        let draft = &request.content_store;
        let content_type = draft.content_type.as_str();
        if ![DRIVE_GOOGLE_DOC, DRIVE_PDF, DRIVE_TEXT].contains(&content_type) {
            return Ok(Vec::new());
        }

        let access_token = self.access_token(&credentials.token).await?;
        let body = match content_type {
            DRIVE_GOOGLE_DOC => {
                let document = self.document(&access_token, &draft.source_id).await?;
                document_text(&document)
            }
            DRIVE_PDF => {
                let bytes = self.download(&access_token, &draft.source_id).await?;
                match text::pdf_text(bytes).await {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::error!(source_id = %draft.source_id, error = %e, "Failed to read PDF");
                        String::new()
                    }
                }
            }
            _ => {
                let bytes = self.download(&access_token, &draft.source_id).await?;
                text::plain_text(&bytes)
            }
        };

        Ok(text::document_records(draft, &body))
    }
}

/// Turn a files listing into drafts.
pub fn parse_files(page: &Value, credentials: &Credentials) -> Listing {
    let content_stores = page["files"]
        .as_array()
        .map(|files| {
            files
                .iter()
                .filter_map(|file| {
                    let id = file["id"].as_str()?;
                    let mime_type = file["mimeType"].as_str()?;
                    Some(ContentStoreDraft {
                        team_id: credentials.team_id.clone(),
                        user_id: credentials.user_id.clone(),
                        url: format!("https://drive.google.com/file/d/{}", id),
                        content_type: drive_content_type(mime_type),
                        name: file["name"].as_str().unwrap_or_default().to_string(),
                        source_id: id.to_string(),
                        source_last_updated: file["modifiedTime"]
                            .as_str()
                            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                            .map(|t| t.with_timezone(&Utc)),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Listing {
        cursor: page["nextPageToken"].as_str().map(str::to_string),
        content_stores,
    }
}

/// Concatenated text of a Google Doc body.
pub fn document_text(document: &Value) -> String {
    document["body"]["content"]
        .as_array()
        .map(|elements| structural_text(elements))
        .unwrap_or_default()
}

/// Text of structural elements, descending into tables and tables of contents.
fn structural_text(elements: &[Value]) -> String {
    let mut out = String::new();

    for element in elements {
        if let Some(paragraph) = element.get("paragraph") {
            for part in paragraph["elements"].as_array().into_iter().flatten() {
                if let Some(content) = part["textRun"]["content"].as_str() {
                    out.push_str(content);
                }
            }
        } else if let Some(table) = element.get("table") {
            for row in table["tableRows"].as_array().into_iter().flatten() {
                for cell in row["tableCells"].as_array().into_iter().flatten() {
                    if let Some(content) = cell["content"].as_array() {
                        out.push_str(&structural_text(content));
                    }
                }
            }
        } else if let Some(toc) = element.get("tableOfContents") {
            if let Some(content) = toc["content"].as_array() {
                out.push_str(&structural_text(content));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn credentials() -> Credentials {
        Credentials {
            integration_id: 5,
            team_id: "T1".to_string(),
            user_id: Some("U2".to_string()),
            token: "refresh".to_string(),
            last_cursor: None,
        }
    }

    fn paragraph(content: &str) -> Value {
        json!({ "paragraph": { "elements": [ { "textRun": { "content": content } } ] } })
    }

    #[test]
    fn test_parse_files() {
        let page = json!({
            "nextPageToken": "page-2",
            "files": [
                {
                    "id": "f1",
                    "name": "Plan",
                    "mimeType": "application/vnd.google-apps.document",
                    "modifiedTime": "2022-02-10T08:30:00.000Z"
                },
                { "id": "f2", "name": "Scan", "mimeType": "application/pdf" }
            ]
        });

        let listing = parse_files(&page, &credentials());
        assert_eq!(listing.cursor.as_deref(), Some("page-2"));
        assert_eq!(listing.content_stores.len(), 2);

        let doc = &listing.content_stores[0];
        assert_eq!(doc.url, "https://drive.google.com/file/d/f1");
        assert_eq!(doc.content_type, DRIVE_GOOGLE_DOC);
        assert_eq!(doc.user_id.as_deref(), Some("U2"));
        assert!(doc.source_last_updated.is_some());
        assert_eq!(listing.content_stores[1].content_type, DRIVE_PDF);
        assert_eq!(listing.content_stores[1].source_last_updated, None);
    }

    #[test]
    fn test_document_text_reads_tables_and_toc() {
        let document = json!({
            "body": {
                "content": [
                    { "sectionBreak": {} },
                    { "tableOfContents": { "content": [ paragraph("Contents\n") ] } },
                    paragraph("Intro. "),
                    {
                        "table": {
                            "tableRows": [
                                { "tableCells": [
                                    { "content": [ paragraph("A1 ") ] },
                                    { "content": [ paragraph("B1\n") ] }
                                ] }
                            ]
                        }
                    }
                ]
            }
        });

        assert_eq!(document_text(&document), "Contents\nIntro. A1 B1\n");
    }

    #[test]
    fn test_document_without_body_is_empty() {
        assert_eq!(document_text(&json!({})), "");
    }

    #[tokio::test]
    async fn test_access_token_requires_client() {
        let source = DriveSource::new(reqwest::Client::new(), &ProviderConfig::default());
        let err = source.access_token("refresh").await.unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
