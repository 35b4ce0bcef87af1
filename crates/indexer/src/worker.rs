//! Job consumption loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Semaphore;

use recall_core::jobs::{IndexJob, JobSubscriber};

use crate::config::IndexerConfig;
use crate::handler::JobHandler;

/// Pause after an empty fetch.
const IDLE_BACKOFF: Duration = Duration::from_millis(100);

/// Decode a job payload, logging payloads that will never decode.
pub fn decode_job(payload: &[u8]) -> Option<IndexJob> {
    match IndexJob::from_payload(payload) {
        Ok(job) => Some(job),
        Err(e) => {
            tracing::warn!(
                error = %e,
                payload = %String::from_utf8_lossy(payload),
                "Dropping undecodable index job"
            );
            None
        }
    }
}

pub struct Worker {
    config: IndexerConfig,
    subscriber: JobSubscriber,
    handler: Arc<JobHandler>,
    semaphore: Arc<Semaphore>,
}

impl Worker {
    pub async fn new(config: IndexerConfig, handler: JobHandler) -> Result<Self> {
        let subscriber = JobSubscriber::connect(&config.queue).await?;
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));

        Ok(Self {
            config,
            subscriber,
            handler: Arc::new(handler),
            semaphore,
        })
    }

    /// Process jobs until `shutdown` resolves.
    pub async fn run(&self, shutdown: impl std::future::Future<Output = ()>) -> Result<()> {
        tracing::info!(
            indexer_id = %self.config.indexer_id,
            max_concurrent = self.config.max_concurrent,
            "Indexer started"
        );

        tokio::select! {
            result = self.process_jobs() => result,
            _ = shutdown => {
                tracing::info!(indexer_id = %self.config.indexer_id, "Indexer stopping");
                // Wait for in-flight jobs to release their permits
                let _ = self
                    .semaphore
                    .acquire_many(self.config.max_concurrent as u32)
                    .await;
                Ok(())
            }
        }
    }

    async fn process_jobs(&self) -> Result<()> {
        loop {
            let permit = self.semaphore.clone().acquire_owned().await?;

            let Some(message) = self.subscriber.receive().await? else {
                drop(permit);
                tokio::time::sleep(IDLE_BACKOFF).await;
                continue;
            };

            // Acked before handling; a failed job waits for the next scheduler cycle.
            self.subscriber.ack(&message).await?;

            let Some(job) = decode_job(&message.payload) else {
                drop(permit);
                continue;
            };

            tracing::debug!(job = job.label(), "Received index job");

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let label = job.label();
                match handler.handle(job).await {
                    Ok(outcome) => tracing::debug!(?outcome, "Index job done"),
                    Err(e) => tracing::error!(job = label, error = %e, "Index job failed"),
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_job() {
        let job = decode_job(br#"{"type":"delete","team_id":"T1","source_ids":["C1"]}"#);
        assert!(matches!(job, Some(IndexJob::Delete { .. })));
    }

    #[test]
    fn test_decode_poison_message() {
        assert!(decode_job(b"\x00\x01garbage").is_none());
        assert!(decode_job(br#"{"type":"upsert"}"#).is_none());
    }
}
