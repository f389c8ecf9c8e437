//! Process-wide cache of loaded workloads
//!
//! Maps a trace name to its materialized virtual machine list so repeated
//! simulation runs over one trace do not re-parse it. Guarantees:
//! - At most one in-flight load per name; concurrent callers for the same
//!   unseen name block on the loading caller and share its result
//! - Callers for distinct names never serialize on each other
//! - Entries live under a byte budget with least-recently-used eviction; an
//!   evicted entry behaves like a never-loaded one and is rebuilt in full on
//!   the next request

use crate::error::WorkloadError;
use crate::loader::WorkloadLoader;
use crate::models::{TraceFragment, VirtualMachine};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Default retention budget for cached workloads (1 GiB)
const DEFAULT_MAX_BYTES: usize = 1024 * 1024 * 1024;

/// Configuration for the workload cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Approximate byte budget for resident entries
    ///
    /// A budget smaller than a single workload makes that workload
    /// uncacheable; [`WorkloadCache::get`] then fails with
    /// [`WorkloadError::CacheExhausted`] instead of silently handing out
    /// data the cache has already discarded.
    pub max_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Counters describing cache behaviour
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Number of resident entries
    pub entries: usize,
    /// Approximate bytes held by resident entries
    pub resident_bytes: usize,
    /// Requests answered from a resident entry
    pub hits: u64,
    /// Requests that triggered a load
    pub misses: u64,
    /// Entries dropped to stay within the byte budget
    pub evictions: u64,
}

struct CacheEntry {
    machines: Arc<Vec<VirtualMachine>>,
    bytes: usize,
    last_used: AtomicU64,
}

/// A concurrency-safe cache of loaded workload traces
///
/// Owned by the simulation harness and shared by reference between parallel
/// runs; there is no ambient global instance.
pub struct WorkloadCache {
    loader: WorkloadLoader,
    config: CacheConfig,
    entries: DashMap<String, CacheEntry>,
    /// Per-name single-flight gates; one gate per distinct name ever requested
    gates: DashMap<String, Arc<Mutex<()>>>,
    resident_bytes: AtomicUsize,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl WorkloadCache {
    /// Create a cache over the given loader with the default configuration
    pub fn new(loader: WorkloadLoader) -> Self {
        Self::with_config(loader, CacheConfig::default())
    }

    /// Create a cache with an explicit configuration
    pub fn with_config(loader: WorkloadLoader, config: CacheConfig) -> Self {
        Self {
            loader,
            config,
            entries: DashMap::new(),
            gates: DashMap::new(),
            resident_bytes: AtomicUsize::new(0),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Return the workload known under `name`, loading it if necessary
    ///
    /// A resident entry is returned immediately. Otherwise the caller takes
    /// the name's flight gate, re-checks, and loads exactly once while other
    /// callers for the same name wait on the gate; callers for different
    /// names proceed independently. The result is published before the gate
    /// is released, so waiters observe it as a hit.
    pub fn get(
        &self,
        name: &str,
        format: &str,
    ) -> Result<Arc<Vec<VirtualMachine>>, WorkloadError> {
        if let Some(machines) = self.lookup(name) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(machines);
        }

        // The gate clone must not be held as a map guard across the lock
        // below, or two names hashing to one shard could deadlock.
        let gate = self.gates.entry(name.to_string()).or_default().value().clone();
        let _guard = gate.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have finished the load while we waited.
        if let Some(machines) = self.lookup(name) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(machines);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let machines = Arc::new(self.loader.load(name, format)?);
        self.publish(name, machines);

        // Re-read what was published: if retention could not keep the entry,
        // fail loudly rather than return data the cache already dropped.
        self.lookup(name).ok_or_else(|| {
            warn!(name, "loaded workload did not fit the cache retention budget");
            WorkloadError::CacheExhausted {
                name: name.to_string(),
            }
        })
    }

    /// Drop all entries; subsequent requests reload from source
    pub fn reset(&self) {
        let names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        for name in names {
            self.remove(&name);
        }
    }

    /// Snapshot of the cache counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            resident_bytes: self.resident_bytes.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn lookup(&self, name: &str) -> Option<Arc<Vec<VirtualMachine>>> {
        let entry = self.entries.get(name)?;
        let tick = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        entry.last_used.store(tick, Ordering::Relaxed);
        Some(Arc::clone(&entry.machines))
    }

    fn publish(&self, name: &str, machines: Arc<Vec<VirtualMachine>>) {
        let bytes = approximate_footprint(&machines);
        let tick = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        let entry = CacheEntry {
            machines,
            bytes,
            last_used: AtomicU64::new(tick),
        };

        if let Some(previous) = self.entries.insert(name.to_string(), entry) {
            self.resident_bytes
                .fetch_sub(previous.bytes, Ordering::Relaxed);
        }
        self.resident_bytes.fetch_add(bytes, Ordering::Relaxed);

        self.evict_to_budget();
    }

    /// Drop least-recently-used entries until the budget is respected
    fn evict_to_budget(&self) {
        while self.resident_bytes.load(Ordering::Relaxed) > self.config.max_bytes {
            let victim = self
                .entries
                .iter()
                .min_by_key(|entry| entry.last_used.load(Ordering::Relaxed))
                .map(|entry| entry.key().clone());

            let Some(victim) = victim else {
                break;
            };
            if self.remove(&victim) {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(name = %victim, "evicted workload to stay within retention budget");
            }
        }
    }

    fn remove(&self, name: &str) -> bool {
        match self.entries.remove(name) {
            Some((_, entry)) => {
                self.resident_bytes.fetch_sub(entry.bytes, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }
}

/// Approximate heap footprint of a materialized workload
fn approximate_footprint(machines: &[VirtualMachine]) -> usize {
    let per_machine = std::mem::size_of::<VirtualMachine>();
    let total: usize = machines
        .iter()
        .map(|vm| {
            per_machine + vm.name.len() + vm.trace.len() * std::mem::size_of::<TraceFragment>()
        })
        .sum();
    // Even an empty workload occupies an entry.
    total.max(1)
}
