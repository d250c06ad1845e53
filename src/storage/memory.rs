//! In-memory object store.
//!
//! All state lives in a `HashMap` behind a mutex, which makes it ideal for
//! unit tests: seed a bucket layout, run a pipeline against it, assert on the
//! results, no external services involved.

use crate::storage::{ErrorKind, ObjectMeta, ObjectStore, StoreError, StoreResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type BucketMap = Arc<Mutex<HashMap<String, HashMap<String, Vec<u8>>>>>;

#[derive(Clone, Default)]
pub struct MemoryStore {
    buckets: BucketMap,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bucket so listings against it succeed.
    ///
    /// # Panics
    ///
    /// Panics if the bucket mutex is poisoned.
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets
            .lock()
            .expect("bucket mutex poisoned")
            .entry(bucket.to_string())
            .or_default();
    }
}

impl ObjectStore for MemoryStore {
    fn get_object(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        let buckets = self.buckets.lock().expect("bucket mutex poisoned");
        buckets
            .get(bucket)
            .and_then(|b| b.get(key))
            .cloned()
            .ok_or_else(|| {
                StoreError::new(
                    ErrorKind::NotFound,
                    format!("object {bucket}/{key} not found"),
                )
            })
    }

    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> StoreResult<()> {
        self.buckets
            .lock()
            .expect("bucket mutex poisoned")
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> StoreResult<Vec<ObjectMeta>> {
        let buckets = self.buckets.lock().expect("bucket mutex poisoned");
        let bucket_map = buckets.get(bucket).ok_or_else(|| {
            StoreError::new(ErrorKind::NotFound, format!("bucket {bucket} not found"))
        })?;

        let mut objects: Vec<ObjectMeta> = bucket_map
            .iter()
            .filter(|(key, _)| prefix.map_or(true, |p| key.starts_with(p)))
            .map(|(key, data)| ObjectMeta {
                key: key.clone(),
                size: data.len() as u64,
            })
            .collect();

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    fn object_exists(&self, bucket: &str, key: &str) -> StoreResult<bool> {
        let buckets = self.buckets.lock().expect("bucket mutex poisoned");
        Ok(buckets.get(bucket).is_some_and(|b| b.contains_key(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_roundtrip() {
        let store = MemoryStore::new();
        store.put_object("b", "k", b"data").unwrap();
        assert_eq!(store.get_object("b", "k").unwrap(), b"data");
        assert!(store.object_exists("b", "k").unwrap());
    }

    #[test]
    fn missing_bucket_fails_listing() {
        let store = MemoryStore::new();
        let err = store.list_objects("nope", None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn prefix_listing_is_sorted() {
        let store = MemoryStore::new();
        store.put_object("b", "gdl/issues/2.bz2", b"x").unwrap();
        store.put_object("b", "gdl/issues/1.bz2", b"x").unwrap();
        store.put_object("b", "jdg/issues/1.bz2", b"x").unwrap();

        let keys: Vec<String> = store
            .list_objects("b", Some("gdl/"))
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["gdl/issues/1.bz2", "gdl/issues/2.bz2"]);
    }
}
