mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{issue, issue_with_rights, page, put_jsonl, rebuilt_item};
use corpus_sanity::listing::{list_issue_files, list_newspapers, list_page_files};
use corpus_sanity::records::{Issue, Page};
use corpus_sanity::{bag, checks, stats, sync, Location, MemoryStore, ObjectStore};
use corpus_sanity::{PoolConfig, WorkerPool};

fn canonical_store() -> MemoryStore {
    let store = MemoryStore::new();
    put_jsonl(
        &store,
        "canonical",
        "GDL/issues/GDL-1900-issues.jsonl.bz2",
        &[
            issue(
                "GDL-1900-01-01-a",
                &["GDL-1900-01-01-a-p0001", "GDL-1900-01-01-a-p0002"],
                &[
                    "GDL-1900-01-01-a-i0001",
                    "GDL-1900-01-01-a-i0001",
                    "GDL-1900-01-01-a-i0002",
                ],
            ),
            issue(
                "GDL-1900-01-02-a",
                &["GDL-1900-01-02-a-p0001"],
                &["GDL-1900-01-02-a-i0001"],
            ),
        ],
    );
    put_jsonl(
        &store,
        "canonical",
        "JDG/issues/JDG-1900-issues.jsonl.bz2",
        &[issue(
            "JDG-1900-01-01-a",
            &["JDG-1900-01-01-a-p0001"],
            &["JDG-1900-01-01-a-i0001"],
        )],
    );
    put_jsonl(
        &store,
        "canonical",
        "GDL/pages/GDL-1900-pages.jsonl.bz2",
        &[
            page("GDL-1900-01-01-a-p0001"),
            page("GDL-1900-01-01-a-p0002"),
            page("GDL-1900-01-02-a-p0001"),
            // Orphan page never referenced by an issue.
            page("GDL-1900-01-03-a-p0001"),
        ],
    );
    put_jsonl(
        &store,
        "canonical",
        "JDG/pages/JDG-1900-pages.jsonl.bz2",
        &[page("JDG-1900-01-01-a-p0001")],
    );
    store
}

fn issue_bag(
    store: &Arc<dyn ObjectStore>,
    location: &Location,
) -> Result<bag::Bag<Issue>> {
    let newspapers = list_newspapers(store.as_ref(), location)?;
    let files = list_issue_files(store.as_ref(), location, &newspapers)?;
    Ok(bag::read_jsonl(Arc::clone(store), &files))
}

#[test]
fn duplicated_content_items_are_reported_with_breakdown() -> Result<()> {
    let store: Arc<dyn ObjectStore> = Arc::new(canonical_store());
    let location = Location::parse("s3://canonical")?;
    let issues = issue_bag(&store, &location)?;

    let duplicates = WorkerPool::scoped(PoolConfig::with_workers(4), |pool| {
        checks::check_duplicate_content_items(issues, pool)
    })?;

    assert_eq!(duplicates.len(), 1);
    let dup = &duplicates[0];
    assert_eq!(dup.id, "GDL-1900-01-01-a-i0001");
    assert_eq!(dup.issue_id, "GDL-1900-01-01-a");
    assert_eq!(dup.newspaper_id, "GDL");
    assert_eq!(dup.year, Some(1900));
    Ok(())
}

#[test]
fn duplicated_issue_ids_are_flagged_across_files() -> Result<()> {
    let store = canonical_store();
    // The same issue id exported into a second newspaper's file.
    put_jsonl(
        &store,
        "canonical",
        "NZZ/issues/NZZ-1900-issues.jsonl.bz2",
        &[
            issue("NZZ-1900-01-01-a", &[], &[]),
            issue("GDL-1900-01-01-a", &[], &[]),
        ],
    );
    let store: Arc<dyn ObjectStore> = Arc::new(store);
    let location = Location::parse("s3://canonical")?;
    let issues = issue_bag(&store, &location)?;

    let dups = WorkerPool::scoped(PoolConfig::with_workers(4), |pool| {
        checks::check_duplicate_issue_ids(issues, pool)
    })?;
    assert_eq!(dups, vec!["GDL-1900-01-01-a"]);
    Ok(())
}

#[test]
fn page_id_consistency_reports_both_directions() -> Result<()> {
    let store: Arc<dyn ObjectStore> = Arc::new(canonical_store());
    let location = Location::parse("s3://canonical")?;
    let newspapers = list_newspapers(store.as_ref(), &location)?;
    let page_files = list_page_files(store.as_ref(), &location, &newspapers)?;

    let issues = issue_bag(&store, &location)?;
    let pages: bag::Bag<Page> = bag::read_jsonl(Arc::clone(&store), &page_files);

    let report = WorkerPool::scoped(PoolConfig::with_workers(4), |pool| {
        checks::check_page_id_consistency(issues, pages, pool)
    })?;

    assert!(!report.is_consistent());
    assert!(report.only_in_issues.is_empty());
    assert_eq!(report.only_in_pages, vec!["GDL-1900-01-03-a-p0001"]);
    Ok(())
}

#[test]
fn per_newspaper_stats_count_issues_and_distinct_pages() -> Result<()> {
    let store: Arc<dyn ObjectStore> = Arc::new(canonical_store());
    let location = Location::parse("s3://canonical")?;
    let issues = issue_bag(&store, &location)?;

    let by_newspaper = WorkerPool::scoped(PoolConfig::with_workers(4), |pool| {
        stats::newspaper_stats(issues, pool)
    })?;

    let gdl = &by_newspaper["GDL"];
    assert_eq!(gdl.n_issues, 2);
    assert_eq!(gdl.n_pages, 3);
    let jdg = &by_newspaper["JDG"];
    assert_eq!(jdg.n_issues, 1);
    assert_eq!(jdg.n_pages, 1);
    Ok(())
}

#[test]
fn access_rights_counted_per_newspaper_and_tag() -> Result<()> {
    let store = MemoryStore::new();
    put_jsonl(
        &store,
        "canonical",
        "GDL/issues/GDL-1900-issues.jsonl.bz2",
        &[
            issue_with_rights("GDL-1900-01-01-a", "open_public"),
            issue_with_rights("GDL-1900-01-02-a", "open_public"),
            issue_with_rights("GDL-1900-01-03-a", "closed"),
        ],
    );
    // No ar field at all.
    put_jsonl(
        &store,
        "canonical",
        "JDG/issues/JDG-1900-issues.jsonl.bz2",
        &[issue("JDG-1900-01-01-a", &[], &[])],
    );

    let store: Arc<dyn ObjectStore> = Arc::new(store);
    let location = Location::parse("s3://canonical")?;
    let issues = issue_bag(&store, &location)?;

    let breakdown = WorkerPool::scoped(PoolConfig::with_workers(4), |pool| {
        stats::access_rights_breakdown(issues, pool)
    })?;

    assert_eq!(
        breakdown.get(&("GDL".to_string(), "open_public".to_string())),
        Some(&2)
    );
    assert_eq!(
        breakdown.get(&("GDL".to_string(), "closed".to_string())),
        Some(&1)
    );
    assert_eq!(
        breakdown.get(&("JDG".to_string(), "unknown".to_string())),
        Some(&1)
    );
    assert_eq!(breakdown.len(), 3);
    Ok(())
}

#[test]
fn rebuilt_sync_reports_missing_issues_both_ways() -> Result<()> {
    let store = canonical_store();
    // Rebuilt bucket: GDL-1900-01-01-a fully rebuilt, GDL-1900-01-02-a and
    // JDG-1900-01-01-a absent, plus one stale issue canonical never had.
    put_jsonl(
        &store,
        "rebuilt",
        "GDL/GDL-1900.jsonl.bz2",
        &[
            rebuilt_item("GDL-1900-01-01-a-i0001"),
            rebuilt_item("GDL-1900-01-01-a-i0002"),
            rebuilt_item("GDL-1899-12-31-a-i0001"),
        ],
    );

    let store: Arc<dyn ObjectStore> = Arc::new(store);
    let canonical = Location::parse("s3://canonical")?;
    let rebuilt = Location::parse("s3://rebuilt")?;

    let report = WorkerPool::scoped(PoolConfig::with_workers(4), |pool| {
        sync::sync_rebuilt(Arc::clone(&store), &canonical, &rebuilt, pool)
    })?;

    let missing: Vec<&str> = report
        .missing_from_rebuilt
        .iter()
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(missing, vec!["GDL-1900-01-02-a", "JDG-1900-01-01-a"]);

    let stale: Vec<&str> = report
        .missing_from_canonical
        .iter()
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(stale, vec!["GDL-1899-12-31-a"]);

    let m = &report.missing_from_rebuilt[0];
    assert_eq!(m.newspaper_id, "GDL");
    assert_eq!(m.year, Some(1900));
    Ok(())
}
