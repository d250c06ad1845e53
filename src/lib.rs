//! # corpus-sanity
//!
//! Sanity-check pipelines for a partitioned newspaper-archive corpus held in
//! object storage. The corpus keeps one subtree per newspaper, with
//! compressed newline-delimited-JSON record files underneath; after every
//! export these pipelines re-count documents, reconcile releases, and emit
//! small reports for human inspection.
//!
//! Everything follows one linear, stateless data flow:
//!
//! 1. **List** the newspaper partitions present under a storage root
//!    ([`listing::list_newspapers`])
//! 2. **Match** each partition's record files with a glob corrected to
//!    shell semantics ([`glob::fixed_glob`], [`listing::list_issue_files`])
//! 3. **Fetch and parse** the files into a lazy, partitioned record
//!    sequence ([`bag::read_records`]) - nothing is read until forced
//! 4. **Aggregate**: count, materialize, or keyed-count the records on a
//!    scoped worker pool ([`Bag::count`], [`cluster::WorkerPool`])
//!
//! ## Quick start
//!
//! ```no_run
//! use corpus_sanity::*;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new("/data/mirror"));
//! let canonical = Location::parse("s3://canonical-data")?;
//!
//! let newspapers = listing::list_newspapers(store.as_ref(), &canonical)?;
//! let files = listing::list_issue_files(store.as_ref(), &canonical, &newspapers)?;
//!
//! let total = WorkerPool::scoped(PoolConfig::with_workers(16), |pool| {
//!     bag::read_records(Arc::clone(&store), &files).count(pool)
//! })?;
//! println!("{total} issues");
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - Counts are worker-count invariant and idempotent across re-forcing;
//!   [`Bag::count_checked`] additionally forces twice and treats any drift
//!   as a defect.
//! - A malformed record line fails the forced aggregate with file/line
//!   context; nothing is skipped silently.
//! - The file matcher's result set exactly equals a conventional shell
//!   glob, whatever the storage backend's native matcher does.
//! - Worker pools acquired through [`WorkerPool::scoped`] are released on
//!   every exit path.
//!
//! ## Feature flags
//!
//! - `compression-bzip2` - decode `.bz2` record files (default)
//! - `compression-gzip` - decode `.gz` record files (default)

pub mod bag;
pub mod checks;
pub mod cluster;
pub mod glob;
pub mod io;
pub mod listing;
pub mod records;
pub mod report;
pub mod stats;
pub mod storage;
pub mod sync;

// General re-exports
pub use bag::{from_vec, read_jsonl, read_records, Bag, Record};
pub use cluster::{PoolConfig, WorkerPool};
pub use storage::{FileRef, LocalStore, Location, MemoryStore, ObjectStore};
