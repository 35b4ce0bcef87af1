//! The provider seam and the registry the scheduler and indexer dispatch through.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::ProviderConfig;
use crate::crypto::Encryptor;
use crate::db::models::{ContentRecord, ContentStoreDraft, Integration};
use crate::error::{CoreError, CoreResult};

use super::gdrive::DriveSource;
use super::kind::IntegrationKind;
use super::notion::NotionSource;
use super::slack::SlackSource;

/// An integration with its token opened.
#[derive(Clone)]
pub struct Credentials {
    pub integration_id: i64,
    pub team_id: String,
    pub user_id: Option<String>,
    pub token: String,
    pub last_cursor: Option<String>,
}

impl Credentials {
    /// Decrypt the token of a stored integration.
    pub fn open(integration: &Integration, encryptor: &Encryptor) -> CoreResult<Self> {
        Ok(Self {
            integration_id: integration.id,
            team_id: integration.team_id.clone(),
            user_id: integration.user_id.clone(),
            token: encryptor.decrypt_str(&integration.token)?,
            last_cursor: integration.last_cursor.clone(),
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("integration_id", &self.integration_id)
            .field("team_id", &self.team_id)
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .field("last_cursor", &self.last_cursor)
            .finish()
    }
}

/// One page of a provider listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    /// Cursor to resume from next cycle, `None` once the listing is exhausted
    pub cursor: Option<String>,
    pub content_stores: Vec<ContentStoreDraft>,
}

/// What the indexer asks a provider to extract.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub content_store: ContentStoreDraft,

    /// Set when the content store row was created by this scheduler cycle
    pub initial_index: bool,

    /// Previous `source_last_updated`; incremental sources read what changed after it
    pub since: Option<DateTime<Utc>>,
}

/// A provider that can list and read content.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Provider this source serves.
    fn kind(&self) -> IntegrationKind;

    /// List one page of objects visible to the credentials.
    async fn list(&self, credentials: &Credentials) -> CoreResult<Listing>;

    /// Read one object into records. Unsupported content types yield no records.
    async fn extract(
        &self,
        credentials: &Credentials,
        request: &ExtractRequest,
    ) -> CoreResult<Vec<ContentRecord>>;
}

/// Sources keyed by provider kind.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<IntegrationKind, Arc<dyn ContentSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the Notion, Drive and Slack sources against the public APIs.
    pub fn standard(http: reqwest::Client, providers: &ProviderConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(NotionSource::new(http.clone())));
        registry.register(Arc::new(DriveSource::new(http.clone(), providers)));
        registry.register(Arc::new(SlackSource::new(http)));
        registry
    }

    pub fn register(&mut self, source: Arc<dyn ContentSource>) {
        self.sources.insert(source.kind(), source);
    }

    pub fn get(&self, kind: IntegrationKind) -> Option<Arc<dyn ContentSource>> {
        self.sources.get(&kind).cloned()
    }

    /// List content for a stored integration type.
    ///
    /// Types without a registered source produce an empty listing.
    pub async fn list(&self, kind: &str, credentials: &Credentials) -> CoreResult<Listing> {
        let source = kind.parse::<IntegrationKind>().ok().and_then(|k| self.get(k));
        match source {
            Some(source) => source.list(credentials).await,
            None => {
                tracing::warn!(kind = %kind, "No source registered for integration type");
                Ok(Listing::default())
            }
        }
    }

    /// Extract a content store through the source for the integration type.
    pub async fn extract(
        &self,
        kind: &str,
        credentials: &Credentials,
        request: &ExtractRequest,
    ) -> CoreResult<Vec<ContentRecord>> {
        let kind = kind
            .parse::<IntegrationKind>()
            .map_err(CoreError::Validation)?;
        let source = self
            .get(kind)
            .ok_or_else(|| CoreError::NotFound(format!("Source for {}", kind)))?;
        source.extract(credentials, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource;

    #[async_trait]
    impl ContentSource for StaticSource {
        fn kind(&self) -> IntegrationKind {
            IntegrationKind::Notion
        }

        async fn list(&self, credentials: &Credentials) -> CoreResult<Listing> {
            Ok(Listing {
                cursor: Some("next".to_string()),
                content_stores: vec![ContentStoreDraft {
                    team_id: credentials.team_id.clone(),
                    user_id: credentials.user_id.clone(),
                    url: "https://www.notion.so/Roadmap-abc".to_string(),
                    content_type: "notion".to_string(),
                    name: "Roadmap".to_string(),
                    source_id: "abc".to_string(),
                    source_last_updated: None,
                }],
            })
        }

        async fn extract(
            &self,
            _credentials: &Credentials,
            _request: &ExtractRequest,
        ) -> CoreResult<Vec<ContentRecord>> {
            Ok(Vec::new())
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            integration_id: 1,
            team_id: "T1".to_string(),
            user_id: Some("U1".to_string()),
            token: "secret-token".to_string(),
            last_cursor: None,
        }
    }

    #[tokio::test]
    async fn test_registry_dispatches_by_kind() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(StaticSource));

        let listing = registry.list("notion", &credentials()).await.unwrap();
        assert_eq!(listing.cursor.as_deref(), Some("next"));
        assert_eq!(listing.content_stores.len(), 1);
        assert_eq!(listing.content_stores[0].team_id, "T1");
    }

    #[tokio::test]
    async fn test_unknown_kind_lists_nothing() {
        let registry = SourceRegistry::new();
        let listing = registry.list("dropbox", &credentials()).await.unwrap();
        assert_eq!(listing, Listing::default());

        let listing = registry.list("slack", &credentials()).await.unwrap();
        assert!(listing.content_stores.is_empty());
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let debug = format!("{:?}", credentials());
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_open_decrypts_token() {
        let encryptor = Encryptor::from_bytes(&Encryptor::generate_key()).unwrap();
        let integration = Integration {
            id: 7,
            team_id: "T1".to_string(),
            kind: "slack".to_string(),
            token: encryptor.encrypt_str("xoxb-1").unwrap(),
            user_id: None,
            created: chrono::Utc::now(),
            updated: None,
            last_cursor: Some("c".to_string()),
            extra: None,
        };

        let credentials = Credentials::open(&integration, &encryptor).unwrap();
        assert_eq!(credentials.token, "xoxb-1");
        assert_eq!(credentials.integration_id, 7);
        assert_eq!(credentials.last_cursor.as_deref(), Some("c"));
    }
}
