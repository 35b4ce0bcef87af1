//! Reconciling a provider listing against stored content stores.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use recall_core::db::models::{ContentStore, ContentStoreDraft, ContentStoreUpdate};

/// What to do with one listed source.
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert {
    /// Unknown source: insert it and index from scratch.
    Insert(ContentStoreDraft),

    /// Changed upstream since the last sync.
    Update {
        draft: ContentStoreDraft,
        update: ContentStoreUpdate,
        since: Option<DateTime<Utc>>,
    },

    /// Unchanged, but the listing user is not yet recorded as having access.
    AddUser {
        draft: ContentStoreDraft,
        update: ContentStoreUpdate,
        since: Option<DateTime<Utc>>,
    },
}

impl Upsert {
    pub fn draft(&self) -> &ContentStoreDraft {
        match self {
            Upsert::Insert(draft) => draft,
            Upsert::Update { draft, .. } | Upsert::AddUser { draft, .. } => draft,
        }
    }

    pub fn initial_index(&self) -> bool {
        matches!(self, Upsert::Insert(_))
    }

    pub fn since(&self) -> Option<DateTime<Utc>> {
        match self {
            Upsert::Insert(_) => None,
            Upsert::Update { since, .. } | Upsert::AddUser { since, .. } => *since,
        }
    }
}

/// Sources of one content type that pruning removes once they are older than a cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retention<'a> {
    pub content_type: &'a str,
    pub cutoff: DateTime<Utc>,
}

impl Retention<'_> {
    /// Whether pruning would delete this source: stale type, older than the
    /// cutoff and not boosted.
    pub fn is_stale(&self, draft: &ContentStoreDraft, row: Option<&ContentStore>) -> bool {
        if draft.content_type != self.content_type || row.is_some_and(|r| r.is_boosted) {
            return false;
        }
        draft
            .source_last_updated
            .or(row.and_then(|r| r.source_last_updated))
            .is_some_and(|updated| updated < self.cutoff)
    }
}

fn merged_user_ids(existing: &[String], user_id: Option<&str>) -> Vec<String> {
    let mut user_ids = existing.to_vec();
    if let Some(user_id) = user_id {
        if !user_ids.iter().any(|u| u == user_id) {
            user_ids.push(user_id.to_string());
        }
    }
    user_ids
}

fn is_newer(listed: Option<DateTime<Utc>>, stored: Option<DateTime<Utc>>) -> bool {
    match (listed, stored) {
        (Some(listed), Some(stored)) => listed > stored,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Decide which listed sources need indexing.
///
/// `existing` holds the stored rows keyed by source id. Sources that are
/// unchanged and already accessible to the listing user are skipped, as are
/// repeated source ids within one listing and sources `retention` would prune.
pub fn plan_upserts(
    drafts: Vec<ContentStoreDraft>,
    existing: &HashMap<String, ContentStore>,
    retention: Option<Retention<'_>>,
) -> Vec<Upsert> {
    let mut seen = HashSet::new();
    let mut plan = Vec::new();

    for draft in drafts {
        if !seen.insert(draft.source_id.clone()) {
            continue;
        }

        let row = existing.get(&draft.source_id);
        if retention.is_some_and(|r| r.is_stale(&draft, row)) {
            continue;
        }

        let Some(row) = row else {
            plan.push(Upsert::Insert(draft));
            continue;
        };

        let update = ContentStoreUpdate {
            name: draft.name.clone(),
            url: draft.url.clone(),
            source_last_updated: draft.source_last_updated.or(row.source_last_updated),
            user_ids: merged_user_ids(&row.user_ids, draft.user_id.as_deref()),
        };
        let since = row.source_last_updated;

        if is_newer(draft.source_last_updated, row.source_last_updated) {
            plan.push(Upsert::Update {
                draft,
                update,
                since,
            });
        } else if update.user_ids.len() != row.user_ids.len() {
            plan.push(Upsert::AddUser {
                draft,
                update,
                since,
            });
        }
    }

    plan
}
