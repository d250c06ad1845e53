//! Consistency checks over canonical corpus data.
//!
//! These are the corpus-wide sanity checks run before a release: duplicate
//! content-item ids within issue tables of contents, duplicate issue ids
//! across the whole corpus, and mismatches between the page ids referenced
//! by issues and the page ids actually present in page files.

use crate::bag::Bag;
use crate::cluster::WorkerPool;
use crate::records::{newspaper_of, year_of, Issue, Page};
use anyhow::Result;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// One duplicated content-item id, with its breakdown for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateContentItem {
    pub id: String,
    pub issue_id: String,
    pub newspaper_id: String,
    pub year: Option<i32>,
}

/// Content-item ids appearing more than once in one issue's table of
/// contents.
#[must_use]
pub fn duplicate_content_item_ids(issue: &Issue) -> Vec<String> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for ci in &issue.i {
        *counts.entry(ci.m.id.as_str()).or_insert(0) += 1;
    }
    let mut dups: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id.to_string())
        .collect();
    dups.sort();
    dups
}

/// Find duplicated content-item ids across the corpus.
///
/// Per-issue duplicates are detected locally (the original pipeline's
/// check); the forced result carries the issue, newspaper, and year
/// breakdown used in the release report.
///
/// # Errors
///
/// Returns an error if forcing the issue bag fails.
pub fn check_duplicate_content_items(
    issues: Bag<Issue>,
    pool: &WorkerPool,
) -> Result<Vec<DuplicateContentItem>> {
    let duplicates = issues
        .flat_map(|issue: &Issue| {
            let issue_id = issue.id.clone();
            duplicate_content_item_ids(issue)
                .into_iter()
                .map(|id| DuplicateContentItem {
                    newspaper_id: newspaper_of(&id).to_string(),
                    year: year_of(&id),
                    issue_id: issue_id.clone(),
                    id,
                })
                .collect()
        })
        .collect(pool)?;

    let journals: BTreeSet<&str> = duplicates
        .iter()
        .map(|d| d.newspaper_id.as_str())
        .collect();
    info!(
        duplicates = duplicates.len(),
        journals = journals.len(),
        "duplicate content-item ids found"
    );
    Ok(duplicates)
}

/// Check that issue ids are unique within the corpus; returns the
/// offending ids, sorted.
///
/// # Errors
///
/// Returns an error if forcing the issue bag fails.
pub fn check_duplicate_issue_ids(issues: Bag<Issue>, pool: &WorkerPool) -> Result<Vec<String>> {
    let counts = issues.count_by(pool, |issue| issue.id.clone())?;
    let total: u64 = counts.values().sum();
    info!(issue_ids = total, "issue ids fetched");

    let dups: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect();
    info!(duplicates = dups.len(), "duplicated issue ids found");
    Ok(dups)
}

/// Page ids present on one side only.
///
/// Page ids are recorded in two places: the `pp` field of issue records
/// and the `id` field of page records. All ids from the first set should
/// be contained in the second, and vice versa.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageIdReport {
    pub only_in_issues: Vec<String>,
    pub only_in_pages: Vec<String>,
}

impl PageIdReport {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.only_in_issues.is_empty() && self.only_in_pages.is_empty()
    }
}

/// Compare the page ids referenced by issues against the page ids present
/// in the page files.
///
/// # Errors
///
/// Returns an error if forcing either bag fails.
pub fn check_page_id_consistency(
    issues: Bag<Issue>,
    pages: Bag<Page>,
    pool: &WorkerPool,
) -> Result<PageIdReport> {
    let from_issues: BTreeSet<String> = issues
        .flat_map(|issue: &Issue| issue.pp.clone())
        .distinct(pool)?
        .into_iter()
        .collect();
    let from_pages: BTreeSet<String> = pages
        .map(|page: &Page| page.id.clone())
        .distinct(pool)?
        .into_iter()
        .collect();

    let report = PageIdReport {
        only_in_issues: from_issues.difference(&from_pages).cloned().collect(),
        only_in_pages: from_pages.difference(&from_issues).cloned().collect(),
    };
    info!(
        only_in_issues = report.only_in_issues.len(),
        only_in_pages = report.only_in_pages.len(),
        "page id consistency checked"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{ContentItem, ContentItemMeta};

    fn issue_with_items(id: &str, items: &[&str]) -> Issue {
        Issue {
            id: id.to_string(),
            pp: Vec::new(),
            i: items
                .iter()
                .map(|ci| ContentItem {
                    m: ContentItemMeta {
                        id: (*ci).to_string(),
                    },
                })
                .collect(),
            ar: None,
        }
    }

    #[test]
    fn local_duplicates_detected() {
        let issue = issue_with_items(
            "GDL-1900-01-02-a",
            &[
                "GDL-1900-01-02-a-i0001",
                "GDL-1900-01-02-a-i0002",
                "GDL-1900-01-02-a-i0001",
            ],
        );
        assert_eq!(
            duplicate_content_item_ids(&issue),
            vec!["GDL-1900-01-02-a-i0001".to_string()]
        );
    }

    #[test]
    fn unique_toc_yields_no_duplicates() {
        let issue = issue_with_items(
            "GDL-1900-01-02-a",
            &["GDL-1900-01-02-a-i0001", "GDL-1900-01-02-a-i0002"],
        );
        assert!(duplicate_content_item_ids(&issue).is_empty());
    }
}
