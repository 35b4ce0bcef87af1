//! Provider kinds and content type strings.

use serde::{Deserialize, Serialize};

/// Content type of Notion pages.
pub const NOTION_PAGE: &str = "notion";

/// Content type of Slack channels.
pub const SLACK_CHANNEL: &str = "slack_channel";

/// Source type of records extracted from Slack messages.
pub const SLACK_MESSAGE: &str = "slack_message";

/// Content type of native Google Docs.
pub const DRIVE_GOOGLE_DOC: &str = "drive#file|application/vnd.google-apps.document";

/// Content type of PDFs stored in Drive.
pub const DRIVE_PDF: &str = "drive#file|application/pdf";

/// Content type of plain text files stored in Drive.
pub const DRIVE_TEXT: &str = "drive#file|text/plain";

/// Content type of plain text files shared in Slack.
pub const SLACK_FILE_TEXT: &str = "slack|text/plain";

/// Content type of PDFs shared in Slack.
pub const SLACK_FILE_PDF: &str = "slack|application/pdf";

/// Content type of Word documents shared in Slack (read through Slack's PDF rendition).
pub const SLACK_FILE_DOCX: &str =
    "slack|application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Content type for a Drive file of the given MIME type.
pub fn drive_content_type(mime_type: &str) -> String {
    format!("drive#file|{}", mime_type)
}

/// Supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationKind {
    Notion,
    #[serde(rename = "gdrive")]
    GoogleDrive,
    Slack,
}

impl IntegrationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationKind::Notion => "notion",
            IntegrationKind::GoogleDrive => "gdrive",
            IntegrationKind::Slack => "slack",
        }
    }

    /// Content type pruned once it stops being updated upstream.
    pub fn stale_content_type(&self) -> &'static str {
        match self {
            IntegrationKind::Notion => NOTION_PAGE,
            IntegrationKind::GoogleDrive => DRIVE_GOOGLE_DOC,
            IntegrationKind::Slack => SLACK_CHANNEL,
        }
    }
}

impl std::fmt::Display for IntegrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IntegrationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notion" => Ok(IntegrationKind::Notion),
            "gdrive" => Ok(IntegrationKind::GoogleDrive),
            "slack" => Ok(IntegrationKind::Slack),
            _ => Err(format!("Unknown integration type: {}", s)),
        }
    }
}
