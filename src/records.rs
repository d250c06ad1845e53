//! Canonical record shapes and identifier conventions.
//!
//! Corpus identifiers are dash-joined: a content-item id like
//! `GDL-1900-01-02-a-i0042` carries the newspaper code, the issue date and
//! edition, and a final item segment. Dropping the last segment yields the
//! issue id; the first segment is the newspaper; the second is the year.
//!
//! Deserialization is deliberately tolerant: the pipeline never validates a
//! schema, so every field beyond the id is defaulted when absent.

use serde::{Deserialize, Serialize};

/// One newspaper issue, as stored in `<newspaper>/issues/*.bz2` files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    /// Page ids belonging to this issue.
    #[serde(default)]
    pub pp: Vec<String>,
    /// Table of contents: the issue's content items.
    #[serde(default)]
    pub i: Vec<ContentItem>,
    /// Access rights / license tag.
    #[serde(default)]
    pub ar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub m: ContentItemMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItemMeta {
    pub id: String,
}

/// One page, as stored in `<newspaper>/pages/*.bz2` files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
}

/// One rebuilt content item (`<newspaper>/*.bz2` in a rebuilt bucket).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuiltItem {
    pub id: String,
}

/// Newspaper code of any corpus identifier (first dash segment).
#[must_use]
pub fn newspaper_of(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

/// Year component of any corpus identifier (second dash segment), if it
/// parses as one.
#[must_use]
pub fn year_of(id: &str) -> Option<i32> {
    id.split('-').nth(1)?.parse().ok()
}

/// Issue id of a content item: everything up to the last dash segment.
#[must_use]
pub fn issue_id_of(content_item_id: &str) -> String {
    match content_item_id.rsplit_once('-') {
        Some((issue, _)) => issue.to_string(),
        None => content_item_id.to_string(),
    }
}
