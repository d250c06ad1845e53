//! Newline-delimited JSON decoding for record files.
//!
//! Every corpus record file is one compressed text blob with one JSON value
//! per line. Decoding is strict by design: a malformed line fails the whole
//! file with key/line context rather than being skipped, so a bad export
//! never turns into a silently short count.

use crate::io::compression::{auto_detect_reader, auto_detect_writer};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, BufRead, BufReader, Cursor, Write};
use std::sync::{Arc, Mutex};

/// Decode a fetched object as newline-delimited JSON.
///
/// The object is decompressed according to `key`'s extension, split into
/// lines, and each non-empty line is parsed as one `T`. Empty files and
/// files of blank lines decode to an empty vector.
///
/// # Errors
///
/// Returns an error if decompression fails or any line is not valid JSON
/// for `T`; the message carries the key and 1-based line number.
pub fn decode_jsonl<T: DeserializeOwned>(data: Vec<u8>, key: &str) -> Result<Vec<T>> {
    let reader = auto_detect_reader(Cursor::new(data), key)
        .with_context(|| format!("set up decompression for {key}"))?;
    let buffered = BufReader::new(reader);

    let mut out = Vec::new();
    for (idx, line) in buffered.lines().enumerate() {
        let line = line.with_context(|| format!("read line {} of {key}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let value: T = serde_json::from_str(&line)
            .with_context(|| format!("parse JSONL line {} of {key}", idx + 1))?;
        out.push(value);
    }
    Ok(out)
}

/// Encode records as newline-delimited JSON, compressed according to the
/// key extension. Inverse of [`decode_jsonl`]; used to seed test fixtures
/// and to write snapshots.
///
/// # Errors
///
/// Returns an error if any record fails to serialize or compression fails.
pub fn encode_jsonl<T: Serialize>(data: &[T], key: &str) -> Result<Vec<u8>> {
    let buffer = SharedBuffer::default();
    {
        let mut writer = auto_detect_writer(buffer.clone(), key)
            .with_context(|| format!("set up compression for {key}"))?;
        for (i, item) in data.iter().enumerate() {
            serde_json::to_writer(&mut writer, item)
                .with_context(|| format!("serialize record #{i} for {key}"))?;
            writer.write_all(b"\n")?;
        }
        writer
            .flush()
            .with_context(|| format!("finish compression for {key}"))?;
        // Dropping the writer finalizes the compressed stream.
    }
    buffer.into_bytes()
}

/// Output sink shared between the codec writer and the caller. The codec
/// writer owns one handle and must be dropped before the bytes are taken.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn into_bytes(self) -> Result<Vec<u8>> {
        let inner = Arc::try_unwrap(self.0)
            .map_err(|_| anyhow::anyhow!("encode buffer still held by a writer"))?;
        Ok(inner.into_inner().expect("encode buffer poisoned"))
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("encode buffer poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
