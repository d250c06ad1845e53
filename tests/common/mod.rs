#![allow(dead_code)]

use corpus_sanity::io::jsonl::encode_jsonl;
use corpus_sanity::{MemoryStore, ObjectStore};
use serde::Serialize;
use serde_json::{json, Value};

/// Seed one record file, compressed according to the key extension.
pub fn put_jsonl<T: Serialize>(store: &MemoryStore, bucket: &str, key: &str, rows: &[T]) {
    let data = encode_jsonl(rows, key).unwrap();
    store.put_object(bucket, key, &data).unwrap();
}

/// A canonical issue record with the given page ids and content-item ids.
pub fn issue(id: &str, pages: &[&str], items: &[&str]) -> Value {
    json!({
        "id": id,
        "pp": pages,
        "i": items
            .iter()
            .map(|ci| json!({ "m": { "id": ci } }))
            .collect::<Vec<_>>(),
    })
}

/// A canonical issue record carrying only an access-rights tag.
pub fn issue_with_rights(id: &str, ar: &str) -> Value {
    json!({ "id": id, "ar": ar })
}

/// A page record.
pub fn page(id: &str) -> Value {
    json!({ "id": id })
}

/// A rebuilt content-item record.
pub fn rebuilt_item(id: &str) -> Value {
    json!({ "id": id })
}
