//! Byte-level IO: transparent decompression and newline-delimited JSON.

pub mod compression;
pub mod jsonl;
