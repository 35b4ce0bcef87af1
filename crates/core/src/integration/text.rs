//! Text normalization, sentence splitting and record building.

use crate::db::models::{ContentRecord, ContentStoreDraft, TEXT_TYPE_CONTENT, TEXT_TYPE_TITLE};
use crate::error::{CoreError, CoreResult};

/// Drop non-ASCII characters and collapse whitespace runs to single spaces.
pub fn normalize(text: &str) -> String {
    let ascii: String = text.chars().filter(char::is_ascii).collect();
    ascii.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether the whitespace after `before` ends a sentence.
///
/// A sentence ends after `.` or `?`, except after abbreviations shaped like
/// `e.g.` (word, dot, word, any) or `Mr.` (upper, lower, dot).
fn ends_sentence(before: &str) -> bool {
    let mut tail = before.chars().rev();
    let p1 = tail.next();
    let p2 = tail.next();
    let p3 = tail.next();
    let p4 = tail.next();

    if !matches!(p1, Some('.') | Some('?')) {
        return false;
    }

    if let (Some(p4), Some('.'), Some(p2)) = (p4, p3, p2) {
        if is_word(p4) && is_word(p2) {
            return false;
        }
    }

    if let (Some(p3), Some(p2), Some('.')) = (p3, p2, p1) {
        if p3.is_ascii_uppercase() && p2.is_ascii_lowercase() {
            return false;
        }
    }

    true
}

/// Split text into sentences on the whitespace that follows `.` or `?`.
///
/// The separator is consumed; pieces keep their terminal punctuation.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() && ends_sentence(&text[..i]) {
            sentences.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    sentences.push(&text[start..]);
    sentences
}

/// Build the records for one document: a title record plus one record per sentence.
///
/// Chunk ids are `{team}-{source}-{n}` numbered from zero over the non-empty
/// sentences; the title record id is `{team}-{source}`. Blank text yields no
/// records at all.
pub fn document_records(draft: &ContentStoreDraft, text: &str) -> Vec<ContentRecord> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let base_id = format!("{}-{}", draft.team_id, draft.source_id);
    let record = |id: String, text: String, text_type: &str| ContentRecord {
        id,
        source_id: draft.source_id.clone(),
        team_id: draft.team_id.clone(),
        user_id: draft.user_id.clone(),
        text,
        text_type: text_type.to_string(),
        source_type: draft.content_type.clone(),
        source_name: draft.name.clone(),
        url: draft.url.clone(),
        last_updated: draft.source_last_updated,
    };

    let mut records: Vec<ContentRecord> = split_sentences(text)
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(n, sentence)| {
            record(
                format!("{}-{}", base_id, n),
                sentence.to_string(),
                TEXT_TYPE_CONTENT,
            )
        })
        .collect();

    records.push(record(base_id, draft.name.clone(), TEXT_TYPE_TITLE));
    records
}

/// Number of sentence chunks among records built by [`document_records`].
pub fn chunk_count(records: &[ContentRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.text_type == TEXT_TYPE_CONTENT)
        .count()
}

/// Extract the text layer of a PDF.
pub async fn pdf_text(bytes: Vec<u8>) -> CoreResult<String> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| CoreError::Extraction(e.to_string()))?
        .map_err(|e| CoreError::Extraction(e.to_string()))
}

/// Decode a text file, replacing invalid UTF-8.
pub fn plain_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ContentStoreDraft {
        ContentStoreDraft {
            team_id: "T1".to_string(),
            user_id: Some("U1".to_string()),
            url: "https://docs.google.com/document/d/doc1".to_string(),
            content_type: "drive#file|application/vnd.google-apps.document".to_string(),
            name: "Onboarding".to_string(),
            source_id: "doc1".to_string(),
            source_last_updated: None,
        }
    }

    #[test]
    fn test_normalize_drops_non_ascii_and_collapses_whitespace() {
        assert_eq!(normalize("  caf\u{e9}\n\n  menu \t today "), "caf menu today");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_split_on_period_and_question_mark() {
        assert_eq!(
            split_sentences("Hello world. How are you? I am fine."),
            vec!["Hello world.", "How are you?", "I am fine."]
        );
    }

    #[test]
    fn test_no_split_after_abbreviations() {
        assert_eq!(
            split_sentences("Bring snacks, e.g. chips. Ask Mr. Smith first."),
            vec!["Bring snacks, e.g. chips.", "Ask Mr. Smith first."]
        );
    }

    #[test]
    fn test_no_split_without_whitespace() {
        assert_eq!(split_sentences("v1.2 is out.Really"), vec!["v1.2 is out.Really"]);
        assert_eq!(split_sentences("."), vec!["."]);
    }

    #[test]
    fn test_document_records_ids_and_title() {
        let records = document_records(&draft(), "First part. Second part.");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "T1-doc1-0");
        assert_eq!(records[0].text, "First part.");
        assert_eq!(records[1].id, "T1-doc1-1");
        assert_eq!(records[2].id, "T1-doc1");
        assert_eq!(records[2].text, "Onboarding");
        assert_eq!(records[2].text_type, TEXT_TYPE_TITLE);
        assert!(records.iter().all(|r| r.user_id.as_deref() == Some("U1")));
        assert_eq!(chunk_count(&records), 2);
    }

    #[test]
    fn test_blank_text_yields_nothing() {
        assert!(document_records(&draft(), "").is_empty());
        assert!(document_records(&draft(), "   ").is_empty());
    }

    #[test]
    fn test_trailing_separator_does_not_create_empty_chunk() {
        let records = document_records(&draft(), "Only one. ");
        assert_eq!(chunk_count(&records), 1);
    }

    #[test]
    fn test_plain_text_is_lossy() {
        assert_eq!(plain_text(b"ok\xff"), "ok\u{fffd}");
    }
}
