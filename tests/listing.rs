mod common;

use anyhow::Result;
use common::{issue, put_jsonl};
use corpus_sanity::listing::{
    list_issue_files, list_newspapers, list_topic_files, resolve_newspapers,
};
use corpus_sanity::{Location, MemoryStore, ObjectStore};

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    put_jsonl(
        &store,
        "canonical",
        "GDL/issues/GDL-1900-issues.jsonl.bz2",
        &[issue("GDL-1900-01-01-a", &[], &[])],
    );
    put_jsonl(
        &store,
        "canonical",
        "GDL/issues/GDL-1901-issues.jsonl.bz2",
        &[issue("GDL-1901-01-01-a", &[], &[])],
    );
    put_jsonl(
        &store,
        "canonical",
        "JDG/issues/JDG-1900-issues.jsonl.bz2",
        &[issue("JDG-1900-01-01-a", &[], &[])],
    );
    put_jsonl(
        &store,
        "canonical",
        "NZZ/pages/NZZ-1900-pages.jsonl.bz2",
        &[issue("NZZ-1900-01-01-a", &[], &[])],
    );
    store
}

#[test]
fn each_partition_listed_exactly_once() -> Result<()> {
    let store = seeded_store();
    let location = Location::parse("s3://canonical")?;

    // Three partitions in storage, multiple files each.
    let newspapers = list_newspapers(&store, &location)?;
    assert_eq!(newspapers, vec!["GDL", "JDG", "NZZ"]);
    Ok(())
}

#[test]
fn discovery_respects_location_prefix() -> Result<()> {
    let store = MemoryStore::new();
    put_jsonl(
        &store,
        "data",
        "canonical/GDL/issues/a.jsonl.bz2",
        &[issue("GDL-1900-01-01-a", &[], &[])],
    );
    put_jsonl(
        &store,
        "data",
        "other/XXX/issues/a.jsonl.bz2",
        &[issue("XXX-1900-01-01-a", &[], &[])],
    );

    let location = Location::parse("s3://data/canonical")?;
    assert_eq!(list_newspapers(&store, &location)?, vec!["GDL"]);
    Ok(())
}

#[test]
fn explicit_newspaper_list_is_used_verbatim() -> Result<()> {
    let store = seeded_store();
    let location = Location::parse("s3://canonical")?;

    // Even identifiers absent from storage pass through untouched.
    let explicit = vec!["ZZZ".to_string(), "GDL".to_string()];
    let resolved = resolve_newspapers(&store, &location, Some(&explicit))?;
    assert_eq!(resolved, explicit);
    Ok(())
}

#[test]
fn issue_files_keep_suffix_and_order() -> Result<()> {
    let store = seeded_store();
    // Distractors: wrong suffix, nested directory.
    store
        .put_object("canonical", "GDL/issues/README.txt", b"notes")
        .unwrap();
    store
        .put_object("canonical", "GDL/issues/old/GDL-1899.jsonl.bz2", b"x")
        .unwrap();

    let location = Location::parse("s3://canonical")?;
    let newspapers = vec!["GDL".to_string(), "JDG".to_string()];
    let files = list_issue_files(&store, &location, &newspapers)?;

    let keys: Vec<&str> = files.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "GDL/issues/GDL-1900-issues.jsonl.bz2",
            "GDL/issues/GDL-1901-issues.jsonl.bz2",
            "JDG/issues/JDG-1900-issues.jsonl.bz2",
        ]
    );
    Ok(())
}

#[test]
fn newspaper_without_issue_files_contributes_nothing() -> Result<()> {
    let store = seeded_store();
    let location = Location::parse("s3://canonical")?;

    // NZZ has pages but no issues subtree.
    let files = list_issue_files(&store, &location, &["NZZ".to_string()])?;
    assert!(files.is_empty());
    Ok(())
}

#[test]
fn topic_files_are_listed_flat() -> Result<()> {
    let store = MemoryStore::new();
    put_jsonl(&store, "topics", "tm-v1.jsonl.bz2", &[issue("a", &[], &[])]);
    put_jsonl(&store, "topics", "tm-v2.jsonl.bz2", &[issue("b", &[], &[])]);
    store.put_object("topics", "nested/tm-v3.jsonl.bz2", b"x").unwrap();

    let location = Location::parse("s3://topics")?;
    let files = list_topic_files(&store, &location)?;
    let keys: Vec<&str> = files.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(keys, vec!["tm-v1.jsonl.bz2", "tm-v2.jsonl.bz2"]);
    Ok(())
}

#[test]
fn missing_bucket_is_a_listing_error() {
    let store = MemoryStore::new();
    let location = Location::parse("s3://nope").unwrap();
    assert!(list_newspapers(&store, &location).is_err());
}
