//! Slack channels, messages and shared files.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::db::models::{ContentRecord, ContentStoreDraft, TEXT_TYPE_CONTENT};
use crate::error::{CoreError, CoreResult};

use super::kind::{
    IntegrationKind, SLACK_CHANNEL, SLACK_FILE_DOCX, SLACK_FILE_PDF, SLACK_FILE_TEXT,
    SLACK_MESSAGE,
};
use super::source::{ContentSource, Credentials, ExtractRequest, Listing};
use super::text;
use super::{bytes_body, json_body};

const SLACK_API: &str = "https://slack.com/api";
const PAGE_LIMIT: &str = "1000";

/// Minimum word count for a question to be indexed.
const MIN_QUESTION_WORDS: usize = 15;

/// Thin Web API client.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(http: reqwest::Client, token: impl Into<String>) -> Self {
        Self::with_base_url(http, token, SLACK_API)
    }

    pub fn with_base_url(
        http: reqwest::Client,
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Call a Web API method. Responses with `ok: false` become provider errors.
    pub async fn call(&self, method: &str, params: &[(&str, &str)]) -> CoreResult<Value> {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, method))
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await?;

        let body = json_body("slack", response).await?;
        if !body["ok"].as_bool().unwrap_or(false) {
            let error = body["error"].as_str().unwrap_or("unknown_error");
            return Err(CoreError::provider("slack", format!("{}: {}", method, error)));
        }
        Ok(body)
    }

    /// Workspace info from `team.info`.
    pub async fn team_info(&self) -> CoreResult<Value> {
        let body = self.call("team.info", &[]).await?;
        Ok(body["team"].clone())
    }

    /// User id of the token's bot, from `auth.test`.
    pub async fn bot_user_id(&self) -> CoreResult<String> {
        let body = self.call("auth.test", &[]).await?;
        body["user_id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CoreError::provider("slack", "auth.test returned no user_id"))
    }

    /// Every public channel, following cursors.
    pub async fn public_channels(&self) -> CoreResult<Vec<Value>> {
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params = vec![("types", "public_channel"), ("limit", PAGE_LIMIT)];
            if let Some(cursor) = cursor.as_deref() {
                params.push(("cursor", cursor));
            }

            let page = self.call("conversations.list", &params).await?;
            if let Some(found) = page["channels"].as_array() {
                channels.extend(found.iter().cloned());
            }

            cursor = response_cursor(&page);
            if cursor.is_none() {
                break;
            }
        }

        Ok(channels)
    }

    /// One page of channel history.
    pub async fn history(&self, channel: &str, params: &[(&str, &str)]) -> CoreResult<Value> {
        let mut all = vec![("channel", channel)];
        all.extend_from_slice(params);
        self.call("conversations.history", &all).await
    }

    /// Channel history, following cursors. With `oldest`, only messages
    /// strictly newer than that ts are returned.
    pub async fn history_since(&self, channel: &str, oldest: Option<&str>) -> CoreResult<Vec<Value>> {
        let mut messages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params = vec![("limit", PAGE_LIMIT)];
            if let Some(oldest) = oldest {
                params.push(("oldest", oldest));
                params.push(("inclusive", "false"));
            }
            if let Some(cursor) = cursor.as_deref() {
                params.push(("cursor", cursor));
            }

            let page = self.history(channel, &params).await?;
            messages.extend(page_messages(&page));

            cursor = response_cursor(&page);
            if cursor.is_none() {
                break;
            }
        }

        Ok(messages)
    }

    /// Download a private file URL with the client's token.
    pub async fn download(&self, url: &str) -> CoreResult<Vec<u8>> {
        let response = self.http.get(url).bearer_auth(&self.token).send().await?;
        bytes_body("slack", response).await
    }
}

fn response_cursor(page: &Value) -> Option<String> {
    page["response_metadata"]["next_cursor"]
        .as_str()
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

fn page_messages(page: &Value) -> Vec<Value> {
    page["messages"].as_array().cloned().unwrap_or_default()
}

/// Parse a Slack timestamp (`"1633036800.000200"`).
pub fn parse_ts(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, "0"));
    if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let secs: i64 = secs.parse().ok()?;
    let micros: u32 = format!("{:0<6}", &frac[..frac.len().min(6)]).parse().ok()?;
    DateTime::from_timestamp(secs, micros * 1000)
}

/// Format a time as a Slack timestamp.
pub fn format_ts(time: &DateTime<Utc>) -> String {
    format!("{}.{:06}", time.timestamp(), time.timestamp_subsec_micros())
}

/// Whether a message is worth indexing: a long question or a message with a link.
pub fn should_index_message(message: &Value) -> bool {
    let text = message["text"].as_str().unwrap_or_default();
    let user = message["user"].as_str().unwrap_or_default();
    if text.is_empty() || user.is_empty() || message["type"].as_str() != Some("message") {
        return false;
    }

    (text.contains('?') && text.split_whitespace().count() >= MIN_QUESTION_WORDS)
        || text.contains("https://")
}

/// Records for the indexable messages of a channel.
pub fn message_records(draft: &ContentStoreDraft, messages: &[Value]) -> Vec<ContentRecord> {
    messages
        .iter()
        .filter(|m| should_index_message(m))
        .filter_map(|message| {
            let ts = message["ts"].as_str()?;
            Some(ContentRecord {
                id: format!("{}-{}", draft.team_id, ts),
                source_id: draft.source_id.clone(),
                team_id: draft.team_id.clone(),
                user_id: message["user"].as_str().map(str::to_string),
                text: message["text"].as_str()?.to_string(),
                text_type: TEXT_TYPE_CONTENT.to_string(),
                source_type: SLACK_MESSAGE.to_string(),
                source_name: draft.name.clone(),
                url: format!("{}/p{}", draft.url, ts.replace('.', "")),
                last_updated: parse_ts(ts),
            })
        })
        .collect()
}

/// Draft for a channel the bot is a member of.
pub fn channel_draft(
    team_id: &str,
    domain: &str,
    channel: &Value,
    last_updated: DateTime<Utc>,
) -> Option<ContentStoreDraft> {
    let id = channel["id"].as_str()?;
    Some(ContentStoreDraft {
        team_id: team_id.to_string(),
        user_id: None,
        url: format!("https://{}.slack.com/archives/{}", domain, id),
        content_type: SLACK_CHANNEL.to_string(),
        name: channel["name"].as_str().unwrap_or_default().to_string(),
        source_id: id.to_string(),
        source_last_updated: Some(last_updated),
    })
}

pub struct SlackSource {
    http: reqwest::Client,
    base_url: String,
}

impl SlackSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, SLACK_API)
    }

    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn client(&self, credentials: &Credentials) -> SlackClient {
        SlackClient::with_base_url(self.http.clone(), &credentials.token, &self.base_url)
    }

    async fn channel_messages(
        &self,
        client: &SlackClient,
        request: &ExtractRequest,
    ) -> CoreResult<Vec<Value>> {
        let draft = &request.content_store;
        let oldest = match (request.initial_index, request.since.or(draft.source_last_updated)) {
            (false, Some(last_updated)) => Some(format_ts(&last_updated)),
            _ => None,
        };
        client.history_since(&draft.source_id, oldest.as_deref()).await
    }

    async fn file_text(&self, client: &SlackClient, draft: &ContentStoreDraft) -> CoreResult<String> {
        let bytes = client.download(&draft.url).await?;
        if draft.content_type == SLACK_FILE_TEXT {
            return Ok(text::plain_text(&bytes));
        }

        match text::pdf_text(bytes).await {
            Ok(body) => Ok(body),
            Err(e) => {
                tracing::error!(source_id = %draft.source_id, error = %e, "Failed to read shared file");
                Ok(String::new())
            }
        }
    }
}

#[async_trait]
impl ContentSource for SlackSource {
    fn kind(&self) -> IntegrationKind {
        IntegrationKind::Slack
    }

    /// Slack channels are listed in full on every cycle, so the listing never has a cursor.
    async fn list(&self, credentials: &Credentials) -> CoreResult<Listing> {
        let client = self.client(credentials);
        let team = client.team_info().await?;
        let domain = team["domain"]
            .as_str()
            .ok_or_else(|| CoreError::provider("slack", "team.info returned no domain"))?
            .to_string();

        let mut content_stores = Vec::new();
        for channel in client.public_channels().await? {
            if !channel["is_member"].as_bool().unwrap_or(false) {
                continue;
            }
            let Some(channel_id) = channel["id"].as_str() else {
                continue;
            };

            let latest = client.history(channel_id, &[("limit", "1")]).await?;
            let last_updated = latest["messages"][0]["ts"]
                .as_str()
                .and_then(parse_ts)
                .unwrap_or_else(Utc::now);

            content_stores.extend(channel_draft(
                &credentials.team_id,
                &domain,
                &channel,
                last_updated,
            ));
        }

        Ok(Listing {
            cursor: None,
            content_stores,
        })
    }

    async fn extract(
        &self,
        credentials: &Credentials,
        request: &ExtractRequest,
    ) -> CoreResult<Vec<ContentRecord>> {
        let draft = &request.content_store;
        let client = self.client(credentials);

        match draft.content_type.as_str() {
            SLACK_CHANNEL => {
                let messages = self.channel_messages(&client, request).await?;
                Ok(message_records(draft, &messages))
            }
            SLACK_FILE_TEXT | SLACK_FILE_PDF | SLACK_FILE_DOCX => {
                let body = self.file_text(&client, draft).await?;
                Ok(text::document_records(draft, &body))
            }
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn channel() -> ContentStoreDraft {
        channel_draft(
            "T1",
            "acme",
            &json!({ "id": "C42", "name": "support", "is_member": true }),
            Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_channel_draft() {
        let draft = channel();
        assert_eq!(draft.url, "https://acme.slack.com/archives/C42");
        assert_eq!(draft.content_type, "slack_channel");
        assert_eq!(draft.user_id, None);
        assert_eq!(draft.name, "support");
    }

    #[test]
    fn test_ts_round_trip() {
        let time = parse_ts("1633036800.000200").unwrap();
        assert_eq!(time.timestamp(), 1633036800);
        assert_eq!(time.timestamp_subsec_micros(), 200);
        assert_eq!(format_ts(&time), "1633036800.000200");
        assert_eq!(parse_ts("1633036800").unwrap().timestamp(), 1633036800);
        assert!(parse_ts("yesterday").is_none());
    }

    #[test]
    fn test_message_filter() {
        let long_question = "Does anyone know how we rotate the staging database credentials when the vault lease expires?";
        assert!(should_index_message(&json!({
            "type": "message", "user": "U1", "text": long_question
        })));
        assert!(should_index_message(&json!({
            "type": "message", "user": "U1", "text": "docs at https://example.com"
        })));
        assert!(!should_index_message(&json!({
            "type": "message", "user": "U1", "text": "lunch?"
        })));
        assert!(!should_index_message(&json!({
            "type": "message", "text": "bot says https://example.com"
        })));
        assert!(!should_index_message(&json!({
            "type": "channel_join", "user": "U1", "text": "https://example.com"
        })));
    }

    #[test]
    fn test_message_records() {
        let messages = vec![
            json!({
                "type": "message",
                "user": "U7",
                "text": "runbook: https://wiki.example.com/runbook",
                "ts": "1640995200.000100"
            }),
            json!({ "type": "message", "user": "U7", "text": "thanks", "ts": "1640995300.000100" }),
        ];

        let records = message_records(&channel(), &messages);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.id, "T1-1640995200.000100");
        assert_eq!(record.url, "https://acme.slack.com/archives/C42/p1640995200000100");
        assert_eq!(record.user_id.as_deref(), Some("U7"));
        assert_eq!(record.source_type, "slack_message");
        assert_eq!(record.source_id, "C42");
        assert_eq!(record.source_name, "support");
        assert!(record.last_updated.is_some());
    }

    fn link_message(n: usize) -> Value {
        json!({
            "type": "message",
            "user": "U1",
            "text": format!("notes at https://wiki.example.com/{}", n),
            "ts": format!("1672617600.{:06}", n)
        })
    }

    fn slack_credentials() -> Credentials {
        Credentials {
            integration_id: 1,
            team_id: "T1".to_string(),
            user_id: None,
            token: "xoxb-test".to_string(),
            last_cursor: None,
        }
    }

    #[tokio::test]
    async fn test_incremental_extract_follows_cursor() {
        use wiremock::matchers::{method, path, query_param, query_param_is_missing};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let first_page: Vec<Value> = (0..100).map(link_message).collect();

        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .and(query_param("channel", "C42"))
            .and(query_param("oldest", "1672531200.000000"))
            .and(query_param("inclusive", "false"))
            .and(query_param_is_missing("cursor"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "messages": first_page,
                "response_metadata": { "next_cursor": "c2" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .and(query_param("channel", "C42"))
            .and(query_param("oldest", "1672531200.000000"))
            .and(query_param("cursor", "c2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "messages": [link_message(100)],
                "response_metadata": { "next_cursor": "" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = SlackSource::with_base_url(reqwest::Client::new(), server.uri());
        let request = ExtractRequest {
            content_store: channel(),
            initial_index: false,
            since: Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
        };

        let records = source.extract(&slack_credentials(), &request).await.unwrap();
        assert_eq!(records.len(), 101);
        assert!(records.iter().any(|r| r.id == "T1-1672617600.000100"));
    }

    #[tokio::test]
    async fn test_initial_extract_reads_full_history() {
        use wiremock::matchers::{method, path, query_param_is_missing};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .and(query_param_is_missing("oldest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "messages": [link_message(1), link_message(2)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = SlackSource::with_base_url(reqwest::Client::new(), server.uri());
        let request = ExtractRequest {
            content_store: channel(),
            initial_index: true,
            since: None,
        };

        let records = source.extract(&slack_credentials(), &request).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_response_cursor_ignores_empty() {
        assert_eq!(response_cursor(&json!({ "response_metadata": { "next_cursor": "" } })), None);
        assert_eq!(
            response_cursor(&json!({ "response_metadata": { "next_cursor": "abc" } })).as_deref(),
            Some("abc")
        );
        assert_eq!(response_cursor(&json!({})), None);
    }
}
