//! Per-newspaper corpus statistics.

use crate::bag::Bag;
use crate::cluster::WorkerPool;
use crate::records::{newspaper_of, Issue};
use anyhow::Result;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::info;

/// Issue and page counts for one newspaper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewspaperStats {
    pub newspaper_id: String,
    pub n_issues: u64,
    pub n_pages: u64,
}

/// Number of issues and pages per newspaper, computed from canonical issue
/// records. Pages are counted as the distinct `pp` entries per issue, the
/// same measure the release notes use.
///
/// # Errors
///
/// Returns an error if forcing the issue bag fails.
pub fn newspaper_stats(
    issues: Bag<Issue>,
    pool: &WorkerPool,
) -> Result<BTreeMap<String, NewspaperStats>> {
    let merged: HashMap<String, (u64, u64)> = issues.fold(
        pool,
        HashMap::new,
        |mut acc, issue: &Issue| {
            let np = newspaper_of(&issue.id).to_string();
            let distinct_pages = issue.pp.iter().collect::<HashSet<_>>().len() as u64;
            let entry = acc.entry(np).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += distinct_pages;
            acc
        },
        |mut a, b| {
            for (np, (issues, pages)) in b {
                let entry = a.entry(np).or_insert((0, 0));
                entry.0 += issues;
                entry.1 += pages;
            }
            a
        },
    )?;

    let stats: BTreeMap<String, NewspaperStats> = merged
        .into_iter()
        .map(|(np, (n_issues, n_pages))| {
            (
                np.clone(),
                NewspaperStats {
                    newspaper_id: np,
                    n_issues,
                    n_pages,
                },
            )
        })
        .collect();
    info!(newspapers = stats.len(), "per-newspaper stats computed");
    Ok(stats)
}

/// Issue counts per newspaper and access-rights tag. Issues carrying no
/// `ar` field are grouped under `"unknown"`.
///
/// # Errors
///
/// Returns an error if forcing the issue bag fails.
pub fn access_rights_breakdown(
    issues: Bag<Issue>,
    pool: &WorkerPool,
) -> Result<BTreeMap<(String, String), u64>> {
    let breakdown = issues.count_by(pool, |issue: &Issue| {
        (
            newspaper_of(&issue.id).to_string(),
            issue.ar.clone().unwrap_or_else(|| "unknown".to_string()),
        )
    })?;
    info!(groups = breakdown.len(), "access-rights breakdown computed");
    Ok(breakdown)
}
