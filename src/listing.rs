//! Partition discovery and record-file listing.
//!
//! A corpus bucket holds one subtree per newspaper; the newspaper code is
//! the top-level key component and the unit of partitioning. Issue files
//! live under `<newspaper>/issues/`, page files under `<newspaper>/pages/`,
//! rebuilt content-item files directly under `<newspaper>/`. Topic-model
//! outputs live in a flat, differently-rooted location.
//!
//! Listing failures (missing bucket, unreachable storage, bad credentials)
//! propagate as fatal errors; none of these functions retry.

use crate::glob::fixed_glob;
use crate::storage::{FileRef, Location, ObjectStore};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Suffix marking a compressed record file.
pub const RECORD_FILE_SUFFIX: &str = ".bz2";

/// Discover the newspaper identifiers present under a storage root.
///
/// Lists immediate child entries of the root and extracts their names;
/// each identifier appears exactly once, sorted.
///
/// # Errors
///
/// Returns an error if the listing fails.
pub fn list_newspapers(store: &dyn ObjectStore, location: &Location) -> Result<Vec<String>> {
    info!(%location, "fetching list of newspapers");

    let prefix = location.prefix.as_ref().map(|p| format!("{p}/"));
    let objects = store
        .list_objects(&location.bucket, prefix.as_deref())
        .with_context(|| format!("list newspapers in {location}"))?;

    let skip = prefix.as_deref().map_or(0, str::len);
    let newspapers: BTreeSet<String> = objects
        .iter()
        .filter_map(|obj| obj.key.get(skip..))
        .filter_map(|rel| rel.split('/').next())
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();

    info!(count = newspapers.len(), %location, "newspapers discovered");
    Ok(newspapers.into_iter().collect())
}

/// Resolve the partition set to operate over: an explicit caller-supplied
/// list is used verbatim, otherwise identifiers are discovered from the
/// storage root.
///
/// # Errors
///
/// Returns an error if discovery is needed and the listing fails.
pub fn resolve_newspapers(
    store: &dyn ObjectStore,
    location: &Location,
    explicit: Option<&[String]>,
) -> Result<Vec<String>> {
    match explicit {
        Some(list) => Ok(list.to_vec()),
        None => list_newspapers(store, location),
    }
}

/// List the compressed record files under `<newspaper>/<subdir>/` for each
/// given newspaper, concatenated in newspaper order.
///
/// Uses the corrected glob so the match set equals a conventional shell
/// glob, then keeps only keys with the compressed-archive suffix. Zero
/// matches for a newspaper is not an error.
///
/// # Errors
///
/// Returns an error if any listing fails.
pub fn list_record_files(
    store: &dyn ObjectStore,
    location: &Location,
    newspapers: &[String],
    subdir: &str,
) -> Result<Vec<FileRef>> {
    let mut files = Vec::new();
    for np in newspapers {
        let pattern = location.key(&format!("{np}/{subdir}/*"));
        let mut matched = fixed_glob(store, &location.bucket, &pattern)?;
        matched.retain(|f| f.key.ends_with(RECORD_FILE_SUFFIX));
        debug!(newspaper = %np, count = matched.len(), "record files matched");
        files.extend(matched);
    }
    info!(
        count = files.len(),
        %location,
        subdir,
        "compressed record files listed"
    );
    Ok(files)
}

/// Issue files for a set of newspapers (`<newspaper>/issues/*`).
///
/// # Errors
///
/// Returns an error if any listing fails.
pub fn list_issue_files(
    store: &dyn ObjectStore,
    location: &Location,
    newspapers: &[String],
) -> Result<Vec<FileRef>> {
    list_record_files(store, location, newspapers, "issues")
}

/// Page files for a set of newspapers (`<newspaper>/pages/*`).
///
/// # Errors
///
/// Returns an error if any listing fails.
pub fn list_page_files(
    store: &dyn ObjectStore,
    location: &Location,
    newspapers: &[String],
) -> Result<Vec<FileRef>> {
    list_record_files(store, location, newspapers, "pages")
}

/// Rebuilt content-item files, which sit directly under each newspaper
/// (`<newspaper>/*`).
///
/// # Errors
///
/// Returns an error if any listing fails.
pub fn list_rebuilt_files(
    store: &dyn ObjectStore,
    location: &Location,
    newspapers: &[String],
) -> Result<Vec<FileRef>> {
    let mut files = Vec::new();
    for np in newspapers {
        let pattern = location.key(&format!("{np}/*"));
        let mut matched = fixed_glob(store, &location.bucket, &pattern)?;
        matched.retain(|f| f.key.ends_with(RECORD_FILE_SUFFIX));
        files.extend(matched);
    }
    info!(count = files.len(), %location, "rebuilt files listed");
    Ok(files)
}

/// Topic-model output files: a flat location with one assignment and one
/// description file per language-model variant, no nesting.
///
/// # Errors
///
/// Returns an error if the listing fails.
pub fn list_topic_files(store: &dyn ObjectStore, location: &Location) -> Result<Vec<FileRef>> {
    let pattern = location.key("*");
    let mut files = fixed_glob(store, &location.bucket, &pattern)?;
    files.retain(|f| f.key.ends_with(RECORD_FILE_SUFFIX));
    info!(count = files.len(), %location, "topic files listed");
    Ok(files)
}
