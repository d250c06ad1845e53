//! Directory-backed object store.
//!
//! Maps a bucket name to a subdirectory of a root path and object keys to
//! relative file paths. Lets the CLI run the same pipelines against a local
//! mirror of the corpus that was produced with `aws s3 sync` or similar.

use crate::storage::{ErrorKind, ObjectMeta, ObjectStore, StoreError, StoreResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }

    fn io_err(kind: ErrorKind, what: &str, path: &Path, e: &io::Error) -> StoreError {
        StoreError::new(kind, format!("{what} {}: {e}", path.display()))
    }
}

impl ObjectStore for LocalStore {
    fn get_object(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        let path = self.object_path(bucket, key);
        fs::read(&path).map_err(|e| {
            let kind = if e.kind() == io::ErrorKind::NotFound {
                ErrorKind::NotFound
            } else {
                ErrorKind::Unreachable
            };
            Self::io_err(kind, "read", &path, &e)
        })
    }

    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> StoreResult<()> {
        let path = self.object_path(bucket, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Self::io_err(ErrorKind::Unreachable, "mkdir", parent, &e))?;
        }
        fs::write(&path, data).map_err(|e| Self::io_err(ErrorKind::Unreachable, "write", &path, &e))
    }

    fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> StoreResult<Vec<ObjectMeta>> {
        let bucket_dir = self.root.join(bucket);
        if !bucket_dir.is_dir() {
            return Err(StoreError::new(
                ErrorKind::NotFound,
                format!("bucket {bucket} not found under {}", self.root.display()),
            ));
        }

        let mut objects = Vec::new();
        walk(&bucket_dir, &bucket_dir, &mut objects)?;
        objects.retain(|o| prefix.map_or(true, |p| o.key.starts_with(p)));
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    fn object_exists(&self, bucket: &str, key: &str) -> StoreResult<bool> {
        Ok(self.object_path(bucket, key).is_file())
    }
}

fn walk(base: &Path, dir: &Path, out: &mut Vec<ObjectMeta>) -> StoreResult<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| LocalStore::io_err(ErrorKind::Unreachable, "list", dir, &e))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| LocalStore::io_err(ErrorKind::Unreachable, "list", dir, &e))?;
        let path = entry.path();
        if path.is_dir() {
            walk(base, &path, out)?;
        } else if path.is_file() {
            let rel = path
                .strip_prefix(base)
                .expect("walked path is under its base");
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            // Keys always use forward slashes, whatever the platform.
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push(ObjectMeta { key, size });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn roundtrip_and_nested_listing() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());

        store
            .put_object("corpus", "GDL/issues/a.jsonl", b"{}\n")
            .unwrap();
        store
            .put_object("corpus", "JDG/issues/b.jsonl", b"{}\n")
            .unwrap();

        assert_eq!(store.get_object("corpus", "GDL/issues/a.jsonl").unwrap(), b"{}\n");

        let keys: Vec<String> = store
            .list_objects("corpus", None)
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["GDL/issues/a.jsonl", "JDG/issues/b.jsonl"]);

        let gdl = store.list_objects("corpus", Some("GDL/")).unwrap();
        assert_eq!(gdl.len(), 1);
    }

    #[test]
    fn missing_bucket_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());
        let err = store.list_objects("nope", None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
