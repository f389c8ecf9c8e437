//! Workload trace ingestion for the compute simulator
//!
//! This crate turns raw workload trace tables into ready-to-simulate
//! virtual machines:
//! - Gapless reconstruction of each machine's demand trace from sparse samples
//! - Join of metadata rows against reconstructed traces, with deterministic
//!   machine identities
//! - Optional cross-machine interference profiles
//! - A concurrency-safe cache so repeated simulation runs over one trace do
//!   not re-parse it

pub mod cache;
pub mod error;
pub mod interference;
pub mod loader;
pub mod models;
pub mod trace_builder;

pub use cache::{CacheConfig, CacheStats, WorkloadCache};
pub use error::WorkloadError;
pub use interference::{InterferenceGroup, InterferenceModel, InterferenceProfile};
pub use loader::{DirectoryResolver, TraceResolver, WorkloadLoader};
pub use models::{TraceFragment, VirtualMachine, VmTrace};
pub use trace_builder::VmTraceBuilder;
