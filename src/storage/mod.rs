//! Object-storage abstractions for corpus data.
//!
//! The sanity-check pipelines only ever read a corpus bucket: list keys under
//! a prefix, fetch whole objects, and (for snapshot outputs) write small
//! objects back. [`ObjectStore`] captures exactly that surface in a
//! provider-agnostic way, with two shipped implementations:
//!
//! - [`MemoryStore`] - in-memory store used throughout the test suite
//! - [`LocalStore`] - a directory on disk standing in for a bucket, so the
//!   CLI can run against a local mirror of the corpus
//!
//! All operations are blocking. A real S3/Swift binding would implement
//! [`ObjectStore`] on top of its SDK and plug in unchanged.

pub mod local;
pub mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use std::error::Error;
use std::fmt;

/// Error type for storage operations.
#[derive(Debug, Clone)]
pub struct StoreError {
    pub message: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Unreachable,
    Other,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for StoreError {}

impl StoreError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Metadata for an object in storage.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
}

/// Read-mostly object storage operations used by the pipelines.
pub trait ObjectStore: Send + Sync {
    /// Download a whole object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object doesn't exist or the fetch fails.
    fn get_object(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>>;

    /// Upload data, replacing any existing object under the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or the upload fails.
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> StoreResult<()>;

    /// List objects whose key starts with `prefix` (all objects if `None`),
    /// sorted by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket doesn't exist or the listing fails.
    fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> StoreResult<Vec<ObjectMeta>>;

    /// Check whether an object exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    fn object_exists(&self, bucket: &str, key: &str) -> StoreResult<bool>;
}

/// A bucket plus optional key prefix, the root the lister and matcher
/// operate under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub bucket: String,
    pub prefix: Option<String>,
}

impl Location {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: None,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Parse `s3://bucket/prefix`, `s3://bucket`, or a bare `bucket/prefix`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the bucket component is empty.
    pub fn parse(uri: &str) -> StoreResult<Self> {
        let rest = uri.strip_prefix("s3://").unwrap_or(uri);
        let mut parts = rest.splitn(2, '/');
        let bucket = parts.next().unwrap_or_default();
        if bucket.is_empty() {
            return Err(StoreError::new(
                ErrorKind::InvalidInput,
                format!("no bucket in storage uri '{uri}'"),
            ));
        }
        let prefix = parts
            .next()
            .map(|p| p.trim_end_matches('/'))
            .filter(|p| !p.is_empty())
            .map(String::from);
        Ok(Self {
            bucket: bucket.to_string(),
            prefix,
        })
    }

    /// Join a relative key onto this location's prefix.
    #[must_use]
    pub fn key(&self, rel: &str) -> String {
        match &self.prefix {
            Some(p) => format!("{p}/{rel}"),
            None => rel.to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "s3://{}/{}", self.bucket, p),
            None => write!(f, "s3://{}", self.bucket),
        }
    }
}

/// One record file in a bucket, as returned by the file matcher.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileRef {
    pub bucket: String,
    pub key: String,
}

impl FileRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}
