//! Sync cycles: prune stale sources, list every integration, reconcile, queue index jobs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use recall_core::crypto::Encryptor;
use recall_core::db::models::Integration;
use recall_core::db::queries::{content_store, integration as integration_queries};
use recall_core::db::DbPool;
use recall_core::integration::{Credentials, SourceRegistry};
use recall_core::jobs::{IndexJob, JobQueue};
use recall_core::{CoreResult, ResultExt};

use crate::config::SchedulerConfig;
use crate::plan::{plan_upserts, Retention, Upsert};

/// Which integrations a cycle covers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncRequest {
    pub team_id: Option<String>,
    pub user_id: Option<String>,
}

impl SyncRequest {
    /// The one user to sync, when both ids are given.
    pub fn user(&self) -> Option<(&str, &str)> {
        match (&self.team_id, &self.user_id) {
            (Some(team_id), Some(user_id)) => Some((team_id.as_str(), user_id.as_str())),
            _ => None,
        }
    }
}

/// Outcome of one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub integrations: usize,
    pub failed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub pruned: usize,
    pub jobs: usize,
}

/// Index jobs gathered during one cycle.
///
/// The upsert limit is checked between integrations: once reached, later
/// integrations wait for the next cycle, but every upsert planned for an
/// integration is queued so none is lost behind its saved cursor.
#[derive(Debug, Default)]
pub struct CycleJobs {
    upsert_limit: usize,
    upserts: usize,
    jobs: Vec<IndexJob>,
}

impl CycleJobs {
    pub fn new(upsert_limit: usize) -> Self {
        Self {
            upsert_limit,
            ..Self::default()
        }
    }

    pub fn is_full(&self) -> bool {
        self.upserts >= self.upsert_limit
    }

    /// Queue an upsert job for every planned source of an integration.
    pub fn push_upserts(&mut self, integration_id: i64, plan: Vec<Upsert>) {
        self.upserts += plan.len();
        self.jobs.extend(plan.into_iter().map(|upsert| IndexJob::Upsert {
            integration_id,
            initial_index: upsert.initial_index(),
            since: upsert.since(),
            content_store: upsert.draft().clone(),
        }));
    }

    pub fn push_delete(&mut self, job: IndexJob) {
        self.jobs.push(job);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[IndexJob] {
        &self.jobs
    }
}

/// Oldest `source_last_updated` kept by pruning.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: i64) -> DateTime<Utc> {
    now - Duration::days(retention_days)
}

pub struct Scheduler {
    pool: DbPool,
    registry: SourceRegistry,
    queue: Arc<dyn JobQueue>,
    encryptor: Encryptor,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        pool: DbPool,
        registry: SourceRegistry,
        queue: Arc<dyn JobQueue>,
        encryptor: Encryptor,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            pool,
            registry,
            queue,
            encryptor,
            config,
        }
    }

    async fn integrations(&self, request: &SyncRequest) -> CoreResult<Vec<Integration>> {
        match request.user() {
            Some((team_id, user_id)) => {
                integration_queries::get_user_integrations(&self.pool, team_id, user_id).await
            }
            None => integration_queries::get_all_integrations(&self.pool).await,
        }
    }

    /// Run one cycle: prune stale sources, then sync each integration.
    ///
    /// Pruning runs first and the planner skips sources it would prune, so a
    /// cycle never queues an upsert and a delete for the same source.
    pub async fn run_cycle(&self, request: &SyncRequest) -> CoreResult<CycleReport> {
        let integrations = self.integrations(request).await?;
        let mut report = CycleReport {
            integrations: integrations.len(),
            ..CycleReport::default()
        };
        let mut jobs = CycleJobs::new(self.config.upsert_limit);

        let cutoff = retention_cutoff(Utc::now(), self.config.retention_days);
        for integration in &integrations {
            if let Some(job) = self
                .prune(integration, cutoff, &mut report)
                .await
                .log_ok(format!("pruning for integration {}", integration.id))
                .flatten()
            {
                jobs.push_delete(job);
            }
        }

        for integration in &integrations {
            if jobs.is_full() {
                tracing::info!(limit = self.config.upsert_limit, "Upsert limit reached");
                break;
            }

            match self
                .sync_integration(integration, cutoff, &mut report)
                .await
                .log(format!("syncing {} integration {}", integration.kind, integration.id))
            {
                Ok(plan) => jobs.push_upserts(integration.id, plan),
                Err(_) => report.failed += 1,
            }
        }

        self.queue.publish(jobs.jobs()).await?;
        report.jobs = jobs.len();

        tracing::info!(
            integrations = report.integrations,
            failed = report.failed,
            inserted = report.inserted,
            updated = report.updated,
            pruned = report.pruned,
            jobs = report.jobs,
            "Sync cycle complete"
        );

        Ok(report)
    }

    async fn sync_integration(
        &self,
        integration: &Integration,
        cutoff: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> CoreResult<Vec<Upsert>> {
        let credentials = Credentials::open(integration, &self.encryptor)?;
        let listing = self.registry.list(&integration.kind, &credentials).await?;

        let source_ids: Vec<String> = listing
            .content_stores
            .iter()
            .map(|d| d.source_id.clone())
            .collect();
        let existing: HashMap<_, _> = content_store::get_content_stores(&self.pool, &source_ids)
            .await?
            .into_iter()
            .map(|row| (row.source_id.clone(), row))
            .collect();

        let retention = integration.integration_kind().map(|kind| Retention {
            content_type: kind.stale_content_type(),
            cutoff,
        });
        let plan = plan_upserts(listing.content_stores, &existing, retention);

        for upsert in &plan {
            match upsert {
                Upsert::Insert(draft) => {
                    content_store::create_content_store(&self.pool, draft).await?;
                    report.inserted += 1;
                }
                Upsert::Update { draft, update, .. } | Upsert::AddUser { draft, update, .. } => {
                    content_store::update_content_store(&self.pool, &draft.source_id, update)
                        .await?;
                    report.updated += 1;
                }
            }
        }

        // Saved once the whole page is recorded; a missing cursor restarts paging next cycle.
        integration_queries::update_integration_cursor(
            &self.pool,
            integration.id,
            listing.cursor.as_deref(),
        )
        .await?;

        tracing::debug!(
            integration_id = integration.id,
            kind = %integration.kind,
            upserts = plan.len(),
            "Integration synced"
        );

        Ok(plan)
    }

    /// Delete stale, non-boosted content stores and return the matching delete job.
    async fn prune(
        &self,
        integration: &Integration,
        cutoff: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> CoreResult<Option<IndexJob>> {
        let Some(kind) = integration.integration_kind() else {
            return Ok(None);
        };

        let stale = content_store::get_stale_content_stores(
            &self.pool,
            &integration.team_id,
            kind.stale_content_type(),
            cutoff,
        )
        .await?;
        if stale.is_empty() {
            return Ok(None);
        }

        let source_ids: Vec<String> = stale.into_iter().map(|row| row.source_id).collect();
        let deleted = content_store::delete_content_stores(&self.pool, &source_ids).await?;
        report.pruned += deleted as usize;

        tracing::info!(
            team_id = %integration.team_id,
            kind = %kind,
            count = deleted,
            "Pruned stale content stores"
        );

        Ok(Some(prune_job(&integration.team_id, source_ids)))
    }

    /// Run cycles on an interval until `shutdown` resolves.
    pub async fn run(
        &self,
        request: &SyncRequest,
        shutdown: impl std::future::Future<Output = ()>,
    ) {
        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Scheduler stopping");
                    return;
                }
                _ = ticker.tick() => {
                    let _ = self.run_cycle(request).await.log("running sync cycle");
                }
            }
        }
    }
}

fn prune_job(team_id: &str, source_ids: Vec<String>) -> IndexJob {
    IndexJob::Delete {
        team_id: team_id.to_string(),
        source_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use recall_core::db::models::{ContentStoreDraft, ContentStoreUpdate};
    use recall_core::jobs::MemoryJobQueue;

    fn page(source_id: &str) -> ContentStoreDraft {
        ContentStoreDraft {
            team_id: "T1".to_string(),
            user_id: Some("U1".to_string()),
            url: format!("https://www.notion.so/Page-{}", source_id),
            content_type: "notion".to_string(),
            name: "Page".to_string(),
            source_id: source_id.to_string(),
            source_last_updated: None,
        }
    }

    fn inserts(ids: &[&str]) -> Vec<Upsert> {
        ids.iter().map(|id| Upsert::Insert(page(id))).collect()
    }

    #[test]
    fn test_limit_keeps_whole_integration() {
        let mut jobs = CycleJobs::new(2);
        assert!(!jobs.is_full());

        jobs.push_upserts(1, inserts(&["p1", "p2", "p3"]));
        assert_eq!(jobs.len(), 3);
        assert!(jobs.is_full());
    }

    #[test]
    fn test_delete_jobs_do_not_count_towards_limit() {
        let mut jobs = CycleJobs::new(1);
        jobs.push_delete(prune_job("T1", vec!["old".to_string()]));
        assert!(!jobs.is_full());

        jobs.push_upserts(4, inserts(&["p1"]));
        assert!(jobs.is_full());
    }

    #[test]
    fn test_upsert_jobs_carry_plan_details() {
        let since = Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap();
        let update = ContentStoreUpdate {
            name: "Page".to_string(),
            url: "https://www.notion.so/Page-p2".to_string(),
            source_last_updated: None,
            user_ids: vec!["U1".to_string()],
        };
        let mut jobs = CycleJobs::new(10);
        jobs.push_upserts(
            7,
            vec![
                Upsert::Insert(page("p1")),
                Upsert::Update {
                    draft: page("p2"),
                    update,
                    since: Some(since),
                },
            ],
        );

        assert_eq!(
            jobs.jobs(),
            &[
                IndexJob::Upsert {
                    integration_id: 7,
                    content_store: page("p1"),
                    initial_index: true,
                    since: None,
                },
                IndexJob::Upsert {
                    integration_id: 7,
                    content_store: page("p2"),
                    initial_index: false,
                    since: Some(since),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_cycle_jobs_publish_deletes_before_upserts() {
        let queue = MemoryJobQueue::new();
        let mut jobs = CycleJobs::new(10);
        jobs.push_delete(prune_job("T1", vec!["stale".to_string()]));
        jobs.push_upserts(1, inserts(&["p1"]));

        queue.publish(jobs.jobs()).await.unwrap();

        let published = queue.drain();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].label(), "delete");
        assert_eq!(published[1].label(), "upsert");
    }

    #[test]
    fn test_sync_request_user() {
        let request = SyncRequest {
            team_id: Some("T1".to_string()),
            user_id: Some("U1".to_string()),
        };
        assert_eq!(request.user(), Some(("T1", "U1")));

        let request = SyncRequest {
            team_id: Some("T1".to_string()),
            user_id: None,
        };
        assert_eq!(request.user(), None);
        assert_eq!(SyncRequest::default().user(), None);
    }

    #[test]
    fn test_retention_cutoff() {
        let now = Utc.with_ymd_and_hms(2022, 7, 1, 0, 0, 0).unwrap();
        let cutoff = retention_cutoff(now, 180);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2022, 1, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_prune_job_shape() {
        let job = prune_job("T1", vec!["C1".to_string()]);
        assert_eq!(
            job,
            IndexJob::Delete {
                team_id: "T1".to_string(),
                source_ids: vec!["C1".to_string()],
            }
        );
    }
}
