//! Canonical-versus-rebuilt reconciliation.
//!
//! After a rebuild run, every canonical issue should reappear in the
//! rebuilt bucket (as content items whose ids derive back to the issue),
//! and nothing should be in the rebuilt bucket that canonical doesn't
//! know about. This module derives both id sets and reports the
//! differences, the input for the next ingestion/rebuild configuration.

use crate::bag::read_jsonl;
use crate::cluster::WorkerPool;
use crate::listing::{list_issue_files, list_rebuilt_files, resolve_newspapers};
use crate::records::{issue_id_of, newspaper_of, year_of, Issue, RebuiltItem};
use crate::storage::{Location, ObjectStore};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// One issue present on only one side, with its reporting breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingIssue {
    pub id: String,
    pub newspaper_id: String,
    pub year: Option<i32>,
}

impl MissingIssue {
    fn new(id: String) -> Self {
        Self {
            newspaper_id: newspaper_of(&id).to_string(),
            year: year_of(&id),
            id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Canonical issues with no rebuilt counterpart (still to rebuild).
    pub missing_from_rebuilt: Vec<MissingIssue>,
    /// Rebuilt issues unknown to canonical (stale rebuilt data).
    pub missing_from_canonical: Vec<MissingIssue>,
}

/// Distinct issue ids in a canonical bucket.
///
/// # Errors
///
/// Returns an error if listing or forcing fails.
pub fn canonical_issue_ids(
    store: Arc<dyn ObjectStore>,
    canonical: &Location,
    newspapers: &[String],
    pool: &WorkerPool,
) -> Result<Vec<String>> {
    let files = list_issue_files(store.as_ref(), canonical, newspapers)?;
    read_jsonl::<Issue>(store, &files)
        .map(|issue: &Issue| issue.id.clone())
        .distinct(pool)
}

/// Distinct issue ids derived from a rebuilt bucket.
///
/// Rebuilt data is organized by content item, not by issue, so issue ids
/// are derived by dropping the last id segment of every content item.
///
/// # Errors
///
/// Returns an error if listing or forcing fails.
pub fn rebuilt_issue_ids(
    store: Arc<dyn ObjectStore>,
    rebuilt: &Location,
    newspapers: &[String],
    pool: &WorkerPool,
) -> Result<Vec<String>> {
    let files = list_rebuilt_files(store.as_ref(), rebuilt, newspapers)?;
    read_jsonl::<RebuiltItem>(store, &files)
        .map(|ci: &RebuiltItem| issue_id_of(&ci.id))
        .distinct(pool)
}

/// Compare canonical and rebuilt issue id sets.
///
/// Newspapers are discovered independently per bucket; an empty rebuilt
/// bucket simply reports every canonical issue as missing.
///
/// # Errors
///
/// Returns an error if any listing or forcing fails.
pub fn sync_rebuilt(
    store: Arc<dyn ObjectStore>,
    canonical: &Location,
    rebuilt: &Location,
    pool: &WorkerPool,
) -> Result<SyncReport> {
    let canonical_newspapers = resolve_newspapers(store.as_ref(), canonical, None)?;
    let rebuilt_newspapers = resolve_newspapers(store.as_ref(), rebuilt, None)?;

    let canonical_ids: BTreeSet<String> =
        canonical_issue_ids(Arc::clone(&store), canonical, &canonical_newspapers, pool)?
            .into_iter()
            .collect();
    let rebuilt_ids: BTreeSet<String> =
        rebuilt_issue_ids(store, rebuilt, &rebuilt_newspapers, pool)?
            .into_iter()
            .collect();

    let report = SyncReport {
        missing_from_rebuilt: canonical_ids
            .difference(&rebuilt_ids)
            .cloned()
            .map(MissingIssue::new)
            .collect(),
        missing_from_canonical: rebuilt_ids
            .difference(&canonical_ids)
            .cloned()
            .map(MissingIssue::new)
            .collect(),
    };
    info!(
        missing_from_rebuilt = report.missing_from_rebuilt.len(),
        missing_from_canonical = report.missing_from_canonical.len(),
        %canonical,
        %rebuilt,
        "canonical/rebuilt sync computed"
    );
    Ok(report)
}
