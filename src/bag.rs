//! Lazy, partitioned record sequences.
//!
//! A [`Bag<T>`] is the pipeline's unit of deferred work: a list of
//! re-computable partition thunks, one per record file (or per chunk of an
//! in-memory source). Nothing is fetched or parsed until an aggregate forces
//! evaluation, and re-forcing re-reads from source since no caching layer
//! exists. Transforms (`map`, `filter`, `flat_map`) wrap the thunks and stay
//! lazy.
//!
//! Aggregates run either sequentially or data-parallel on a
//! [`WorkerPool`](crate::cluster::WorkerPool); results are worker-count
//! invariant because partition contents never depend on scheduling, only
//! their evaluation order does. Consumers must not depend on record order
//! across partitions.
//!
//! A malformed record line fails its partition, which fails the whole forced
//! aggregate; there is no skip-and-count-bad-lines side channel.

use crate::cluster::WorkerPool;
use crate::io::jsonl::decode_jsonl;
use crate::storage::{FileRef, ObjectStore};
use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, info};

type PartitionFn<T> = Arc<dyn Fn() -> Result<Vec<T>> + Send + Sync>;

pub struct Bag<T> {
    parts: Vec<PartitionFn<T>>,
}

impl<T> Clone for Bag<T> {
    fn clone(&self) -> Self {
        Self {
            parts: self.parts.clone(),
        }
    }
}

/// A schemaless record: one JSON value per line, nothing validated beyond
/// "valid JSON".
pub type Record = Value;

/// Build a bag of schemaless records from compressed JSONL files, one
/// partition per file. Purely lazy: no file is touched here.
pub fn read_records(store: Arc<dyn ObjectStore>, files: &[FileRef]) -> Bag<Record> {
    read_jsonl(store, files)
}

/// Typed variant of [`read_records`] for pipelines that deserialize into a
/// known shape (issues, content items).
pub fn read_jsonl<T>(store: Arc<dyn ObjectStore>, files: &[FileRef]) -> Bag<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let parts = files
        .iter()
        .cloned()
        .map(|file| {
            let store = Arc::clone(&store);
            let thunk: PartitionFn<T> = Arc::new(move || {
                let data = store
                    .get_object(&file.bucket, &file.key)
                    .with_context(|| format!("fetch {file}"))?;
                decode_jsonl(data, &file.key).with_context(|| format!("decode {file}"))
            });
            thunk
        })
        .collect();
    Bag { parts }
}

/// Build a bag from an in-memory vector, split into `partitions` chunks.
/// Mostly useful in tests and for small derived sequences.
pub fn from_vec<T>(data: Vec<T>, partitions: usize) -> Bag<T>
where
    T: Clone + Send + Sync + 'static,
{
    let n = partitions.max(1).min(data.len().max(1));
    let chunk = data.len().div_ceil(n).max(1);
    let parts = data
        .chunks(chunk)
        .map(|c| {
            let owned = c.to_vec();
            let thunk: PartitionFn<T> = Arc::new(move || Ok(owned.clone()));
            thunk
        })
        .collect();
    Bag { parts }
}

impl<T: Send + 'static> Bag<T> {
    /// Number of partitions (record files) behind this bag.
    #[must_use]
    pub fn num_partitions(&self) -> usize {
        self.parts.len()
    }

    /// Lazily transform each record.
    pub fn map<O, F>(self, f: F) -> Bag<O>
    where
        O: Send + 'static,
        F: Fn(&T) -> O + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let parts = self
            .parts
            .into_iter()
            .map(|part| {
                let f = Arc::clone(&f);
                let thunk: PartitionFn<O> =
                    Arc::new(move || Ok(part()?.iter().map(|t| f(t)).collect()));
                thunk
            })
            .collect();
        Bag { parts }
    }

    /// Lazily keep records matching a predicate.
    pub fn filter<P>(self, pred: P) -> Bag<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let pred = Arc::new(pred);
        let parts = self
            .parts
            .into_iter()
            .map(|part| {
                let pred = Arc::clone(&pred);
                let thunk: PartitionFn<T> = Arc::new(move || {
                    let mut v = part()?;
                    v.retain(|t| pred(t));
                    Ok(v)
                });
                thunk
            })
            .collect();
        Bag { parts }
    }

    /// Lazily expand each record into zero or more outputs.
    pub fn flat_map<O, F>(self, f: F) -> Bag<O>
    where
        O: Send + 'static,
        F: Fn(&T) -> Vec<O> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let parts = self
            .parts
            .into_iter()
            .map(|part| {
                let f = Arc::clone(&f);
                let thunk: PartitionFn<O> = Arc::new(move || {
                    let mut out = Vec::new();
                    for t in &part()? {
                        out.extend(f(t));
                    }
                    Ok(out)
                });
                thunk
            })
            .collect();
        Bag { parts }
    }

    /// Force evaluation sequentially and count records, discarding payloads.
    ///
    /// # Errors
    ///
    /// Returns the first partition error (fetch, decompression, or parse).
    pub fn count_seq(&self) -> Result<u64> {
        let mut total = 0u64;
        for part in &self.parts {
            total += part()?.len() as u64;
        }
        Ok(total)
    }

    /// Force evaluation on the worker pool and count records.
    ///
    /// The total is invariant under the worker count: each partition
    /// contributes its own record count and the merge is a plain sum.
    ///
    /// # Errors
    ///
    /// Returns the first partition error; a single malformed line aborts
    /// the whole count.
    pub fn count(&self, pool: &WorkerPool) -> Result<u64> {
        let parts = &self.parts;
        let total = pool.install(|| {
            parts
                .par_iter()
                .map(|part| part().map(|v| v.len() as u64))
                .try_reduce(|| 0u64, |a, b| Ok(a + b))
        })?;
        info!(total, partitions = parts.len(), "count forced");
        Ok(total)
    }

    /// Count twice against the same source and fail on any disagreement.
    ///
    /// Counting an immutable snapshot is deterministic by construction, so
    /// a drift between the two forcings means the underlying data changed
    /// mid-run (or a deeper defect) and is surfaced instead of silently
    /// accepting either total.
    ///
    /// # Errors
    ///
    /// Returns an error if either forcing fails or the totals disagree.
    pub fn count_checked(&self, pool: &WorkerPool) -> Result<u64> {
        let first = self.count(pool)?;
        let second = self.count(pool)?;
        if first != second {
            bail!("count is not reproducible: {first} vs {second}; source data changed mid-run?");
        }
        Ok(first)
    }

    /// Force evaluation sequentially and materialize all records locally.
    ///
    /// Only safe for small result sets (file listings, id samples); never
    /// materialize the multi-million-record collections.
    ///
    /// # Errors
    ///
    /// Returns the first partition error.
    pub fn collect_seq(&self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend(part()?);
        }
        Ok(out)
    }

    /// Parallel variant of [`collect_seq`](Self::collect_seq); partition
    /// order is preserved in the output.
    ///
    /// # Errors
    ///
    /// Returns the first partition error.
    pub fn collect(&self, pool: &WorkerPool) -> Result<Vec<T>> {
        let parts = &self.parts;
        let chunks: Vec<Vec<T>> = pool.install(|| {
            parts
                .par_iter()
                .map(|part| part())
                .collect::<Result<Vec<_>>>()
        })?;
        debug!(partitions = chunks.len(), "collect forced");
        Ok(chunks.into_iter().flatten().collect())
    }

    /// Two-phase fold: build a local accumulator per partition, then merge
    /// accumulators associatively. `merge` must be order-insensitive for
    /// the result to be worker-count invariant.
    ///
    /// # Errors
    ///
    /// Returns the first partition error.
    pub fn fold<A, I, F, M>(&self, pool: &WorkerPool, init: I, f: F, merge: M) -> Result<A>
    where
        A: Send,
        I: Fn() -> A + Send + Sync,
        F: Fn(A, &T) -> A + Send + Sync,
        M: Fn(A, A) -> A + Send + Sync,
    {
        let parts = &self.parts;
        pool.install(|| {
            parts
                .par_iter()
                .map(|part| Ok(part()?.iter().fold(init(), &f)))
                .try_reduce(&init, |a, b| Ok(merge(a, b)))
        })
    }

    /// Two-phase keyed count: a local map per partition, then an
    /// associative merge. Output is sorted by key for stable reports.
    ///
    /// # Errors
    ///
    /// Returns the first partition error.
    pub fn count_by<K, F>(&self, pool: &WorkerPool, key_fn: F) -> Result<BTreeMap<K, u64>>
    where
        K: Ord + Eq + Hash + Send + 'static,
        F: Fn(&T) -> K + Send + Sync,
    {
        let parts = &self.parts;
        let locals: Vec<HashMap<K, u64>> = pool.install(|| {
            parts
                .par_iter()
                .map(|part| {
                    let mut acc: HashMap<K, u64> = HashMap::new();
                    for t in &part()? {
                        *acc.entry(key_fn(t)).or_insert(0) += 1;
                    }
                    Ok(acc)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut merged: BTreeMap<K, u64> = BTreeMap::new();
        for local in locals {
            for (k, v) in local {
                *merged.entry(k).or_insert(0) += v;
            }
        }
        Ok(merged)
    }
}

impl<T: Ord + Send + 'static> Bag<T> {
    /// Force evaluation and materialize the distinct records, sorted.
    /// Local sets per partition, merged into one.
    ///
    /// # Errors
    ///
    /// Returns the first partition error.
    pub fn distinct(&self, pool: &WorkerPool) -> Result<Vec<T>> {
        let parts = &self.parts;
        let locals: Vec<BTreeSet<T>> = pool.install(|| {
            parts
                .par_iter()
                .map(|part| Ok(part()?.into_iter().collect::<BTreeSet<T>>()))
                .collect::<Result<Vec<_>>>()
        })?;

        let mut merged = BTreeSet::new();
        for local in locals {
            merged.extend(local);
        }
        Ok(merged.into_iter().collect())
    }
}
