//! Worker-pool provisioning for parallel aggregation.
//!
//! The notebooks this replaces held a "current cluster" as a free variable
//! and closed it only on the happy path. Here pool acquisition is explicit
//! and scoped: [`PoolConfig`] enumerates the recognized options and is
//! validated eagerly before provisioning, and [`WorkerPool::scoped`]
//! releases the pool on every exit path, including when the aggregation
//! step errors.
//!
//! The local backend is a dedicated rayon thread pool; the per-worker
//! memory limit is advisory there (it maps to a pod resource cap on a
//! cluster scheduler) and is recorded and logged, not enforced.

use anyhow::{bail, Context, Result};
use tracing::info;

/// Validated worker-pool configuration.
///
/// - `workers` - parallelism degree (number of pool threads)
/// - `memory_per_worker` - advisory per-worker resource cap, in bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub workers: usize,
    pub memory_per_worker: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            memory_per_worker: None,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            memory_per_worker: None,
        }
    }

    /// Set the advisory per-worker memory cap from a humane size string
    /// (`"1G"`, `"512M"`, `"1024"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the size string doesn't parse.
    pub fn with_memory_limit(mut self, limit: &str) -> Result<Self> {
        self.memory_per_worker = Some(parse_memory(limit)?);
        Ok(self)
    }

    /// Check the configuration before any resource is provisioned.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero worker count or a zero memory cap.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            bail!("worker count must be at least 1");
        }
        if self.memory_per_worker == Some(0) {
            bail!("per-worker memory limit must be non-zero");
        }
        Ok(())
    }
}

/// Parse a memory size like `"1G"`, `"512M"`, `"64K"`, or plain bytes.
/// Binary units, case-insensitive, optional trailing `B`.
///
/// # Errors
///
/// Returns an error on an empty string or unrecognized suffix.
pub fn parse_memory(s: &str) -> Result<u64> {
    let s = s.trim();
    if s.is_empty() {
        bail!("empty memory size");
    }
    let upper = s.to_ascii_uppercase();
    let body = upper.strip_suffix('B').unwrap_or(&upper);
    let (digits, multiplier) = match body.chars().last() {
        Some('K') => (&body[..body.len() - 1], 1u64 << 10),
        Some('M') => (&body[..body.len() - 1], 1u64 << 20),
        Some('G') => (&body[..body.len() - 1], 1u64 << 30),
        Some(c) if c.is_ascii_digit() => (body, 1),
        _ => bail!("unrecognized memory size '{s}'"),
    };
    let value: u64 = digits
        .parse()
        .with_context(|| format!("invalid memory size '{s}'"))?;
    Ok(value * multiplier)
}

/// A provisioned pool of N independent workers. Dropping the pool releases
/// its threads.
#[derive(Debug)]
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    config: PoolConfig,
}

impl WorkerPool {
    /// Validate the configuration and provision the pool, blocking until
    /// the workers are ready.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the pool cannot be built.
    pub fn provision(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("sanity-worker-{i}"))
            .build()
            .with_context(|| format!("provision pool with {} workers", config.workers))?;
        info!(
            workers = config.workers,
            memory_per_worker = config.memory_per_worker,
            "worker pool provisioned"
        );
        Ok(Self { pool, config })
    }

    /// Provision a pool, run `f` with it, and release the pool whether or
    /// not `f` succeeds.
    ///
    /// # Errors
    ///
    /// Returns the provisioning error or whatever `f` returns.
    pub fn scoped<R>(config: PoolConfig, f: impl FnOnce(&WorkerPool) -> Result<R>) -> Result<R> {
        let pool = Self::provision(config)?;
        let out = f(&pool);
        drop(pool);
        info!("worker pool released");
        out
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.config.workers
    }

    /// Run an operation inside the pool; rayon parallel iterators invoked
    /// within use this pool's threads.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}
