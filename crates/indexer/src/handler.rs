//! Index job handling.

use recall_core::crypto::Encryptor;
use recall_core::db::models::{ContentRecord, ContentStoreDraft};
use recall_core::db::queries::{content_record, content_store, integration};
use recall_core::db::DbPool;
use recall_core::integration::kind::SLACK_CHANNEL;
use recall_core::integration::{text, Credentials, ExtractRequest, SourceRegistry};
use recall_core::jobs::IndexJob;
use recall_core::result_ext::OptionExt;
use recall_core::CoreResult;

/// Result of one handled job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Records written for a source, with the new `num_vectors`.
    Indexed {
        source_id: String,
        written: u64,
        removed: u64,
        num_vectors: i32,
    },

    /// Records removed for deleted sources.
    Deleted { removed: u64 },

    /// The job referred to an integration that no longer exists.
    Skipped,
}

/// Chunk ids left over from a previous, longer extraction of the same source.
pub fn stale_record_ids(
    team_id: &str,
    source_id: &str,
    previous_count: i32,
    new_count: usize,
) -> Vec<String> {
    let previous = usize::try_from(previous_count).unwrap_or(0);
    (new_count..previous)
        .map(|n| format!("{}-{}-{}", team_id, source_id, n))
        .collect()
}

/// How stored records are reconciled after an extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordCleanup {
    /// Channels keep earlier messages; `num_vectors` is the stored record count.
    CountStored,

    /// Nothing was extracted: every record of the source goes.
    RemoveSource,

    /// Chunks past the new end are removed.
    RemoveChunks {
        stale_ids: Vec<String>,
        num_vectors: usize,
    },
}

/// Decide how to reconcile records for `draft`, given the freshly extracted
/// `records` and the `num_vectors` stored before this job.
pub fn record_cleanup(
    draft: &ContentStoreDraft,
    records: &[ContentRecord],
    previous_num_vectors: i32,
) -> RecordCleanup {
    if draft.content_type == SLACK_CHANNEL {
        return RecordCleanup::CountStored;
    }
    if records.is_empty() {
        return RecordCleanup::RemoveSource;
    }

    let num_vectors = text::chunk_count(records);
    RecordCleanup::RemoveChunks {
        stale_ids: stale_record_ids(
            &draft.team_id,
            &draft.source_id,
            previous_num_vectors,
            num_vectors,
        ),
        num_vectors,
    }
}

pub struct JobHandler {
    pool: DbPool,
    registry: SourceRegistry,
    encryptor: Encryptor,
}

impl JobHandler {
    pub fn new(pool: DbPool, registry: SourceRegistry, encryptor: Encryptor) -> Self {
        Self {
            pool,
            registry,
            encryptor,
        }
    }

    pub async fn handle(&self, job: IndexJob) -> CoreResult<JobOutcome> {
        match job {
            IndexJob::Upsert {
                integration_id,
                content_store,
                initial_index,
                since,
            } => {
                let request = ExtractRequest {
                    content_store,
                    initial_index,
                    since,
                };
                self.upsert(integration_id, request).await
            }
            IndexJob::Delete {
                team_id,
                source_ids,
            } => {
                let removed =
                    content_record::delete_content_records_for_sources(&self.pool, &source_ids)
                        .await?;
                tracing::info!(team_id = %team_id, sources = source_ids.len(), removed, "Deleted records");
                Ok(JobOutcome::Deleted { removed })
            }
        }
    }

    async fn upsert(&self, integration_id: i64, request: ExtractRequest) -> CoreResult<JobOutcome> {
        let Some(stored) = integration::get_integration(&self.pool, integration_id)
            .await?
            .log_none(format!("integration {} for index job", integration_id))
        else {
            return Ok(JobOutcome::Skipped);
        };

        let credentials = Credentials::open(&stored, &self.encryptor)?;
        let records = self
            .registry
            .extract(&stored.kind, &credentials, &request)
            .await?;

        let draft = &request.content_store;
        let written = content_record::upsert_content_records(&self.pool, &records).await?;

        let previous = content_store::get_content_store(&self.pool, &draft.source_id)
            .await?
            .map(|row| row.num_vectors)
            .unwrap_or(0);

        let (removed, num_vectors) = match record_cleanup(draft, &records, previous) {
            RecordCleanup::CountStored => {
                let total =
                    content_record::count_content_records(&self.pool, &draft.source_id).await?;
                (0, total)
            }
            RecordCleanup::RemoveSource => {
                let removed = content_record::delete_content_records_for_sources(
                    &self.pool,
                    std::slice::from_ref(&draft.source_id),
                )
                .await?;
                (removed, 0)
            }
            RecordCleanup::RemoveChunks {
                stale_ids,
                num_vectors,
            } => {
                let removed = content_record::delete_content_records(&self.pool, &stale_ids).await?;
                (removed, num_vectors as i64)
            }
        };

        let num_vectors = i32::try_from(num_vectors).unwrap_or(i32::MAX);
        content_store::set_num_vectors(&self.pool, &draft.source_id, num_vectors).await?;

        tracing::info!(
            source_id = %draft.source_id,
            content_type = %draft.content_type,
            written,
            removed,
            num_vectors,
            "Indexed source"
        );

        Ok(JobOutcome::Indexed {
            source_id: draft.source_id.clone(),
            written,
            removed,
            num_vectors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_ids_when_document_shrinks() {
        assert_eq!(
            stale_record_ids("T1", "doc1", 5, 3),
            vec!["T1-doc1-3".to_string(), "T1-doc1-4".to_string()]
        );
    }

    #[test]
    fn test_no_stale_ids_when_document_grows_or_is_new() {
        assert!(stale_record_ids("T1", "doc1", 3, 3).is_empty());
        assert!(stale_record_ids("T1", "doc1", 2, 7).is_empty());
        assert!(stale_record_ids("T1", "doc1", 0, 4).is_empty());
        assert!(stale_record_ids("T1", "doc1", -1, 0).is_empty());
    }

    fn document() -> ContentStoreDraft {
        ContentStoreDraft {
            team_id: "T1".to_string(),
            user_id: Some("U1".to_string()),
            url: "https://drive.google.com/file/d/doc1".to_string(),
            content_type: "drive#file|application/pdf".to_string(),
            name: "Handbook".to_string(),
            source_id: "doc1".to_string(),
            source_last_updated: None,
        }
    }

    #[test]
    fn test_shrunk_document_removes_trailing_chunks() {
        let draft = document();
        let records = text::document_records(&draft, "First rule. Second rule.");

        assert_eq!(
            record_cleanup(&draft, &records, 4),
            RecordCleanup::RemoveChunks {
                stale_ids: vec!["T1-doc1-2".to_string(), "T1-doc1-3".to_string()],
                num_vectors: 2,
            }
        );
    }

    #[test]
    fn test_empty_extraction_removes_source() {
        assert_eq!(record_cleanup(&document(), &[], 6), RecordCleanup::RemoveSource);
    }

    #[test]
    fn test_slack_channel_counts_stored_records() {
        let mut draft = document();
        draft.content_type = SLACK_CHANNEL.to_string();
        assert_eq!(record_cleanup(&draft, &[], 12), RecordCleanup::CountStored);
    }
}
