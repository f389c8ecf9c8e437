//! Loading a named workload trace into virtual machines
//!
//! One load makes three sequential passes: the resource-state table is
//! demultiplexed into one trace builder per machine id, the interference
//! table is folded into an [`InterferenceModel`], and the resource table is
//! joined against the builders to materialize [`VirtualMachine`]s.

use crate::error::WorkloadError;
use crate::interference::InterferenceModel;
use crate::models::VirtualMachine;
use crate::trace_builder::VmTraceBuilder;
use sim_trace::{open_trace, TraceError, TraceSource};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Memory capacity conversion factor from the source unit (kB) to MB
const MEM_KB_PER_MB: f64 = 1000.0;

/// Resolves a trace name and format tag to an opened trace source
pub trait TraceResolver: Send + Sync {
    /// Open the trace known under `name`
    fn resolve(&self, name: &str, format: &str) -> Result<Box<dyn TraceSource>, TraceError>;
}

/// Resolves trace names against a base directory on disk
#[derive(Debug)]
pub struct DirectoryResolver {
    base_dir: PathBuf,
}

impl DirectoryResolver {
    /// Create a resolver rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl TraceResolver for DirectoryResolver {
    fn resolve(&self, name: &str, format: &str) -> Result<Box<dyn TraceSource>, TraceError> {
        let path = self.base_dir.join(name);
        debug!(name, format, path = %path.display(), "resolving trace");
        open_trace(&path, format)
    }
}

/// Loads workload traces into sorted virtual machine lists
pub struct WorkloadLoader {
    resolver: Arc<dyn TraceResolver>,
}

impl WorkloadLoader {
    /// Create a loader reading traces from the given directory
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_resolver(Arc::new(DirectoryResolver::new(base_dir)))
    }

    /// Create a loader with a custom trace resolver
    pub fn with_resolver(resolver: Arc<dyn TraceResolver>) -> Self {
        Self { resolver }
    }

    /// Load the trace known under `name`, returning machines sorted by
    /// start time
    ///
    /// Any failure opening or reading a required table aborts this load and
    /// surfaces to the caller; nothing is retried.
    pub fn load(&self, name: &str, format: &str) -> Result<Vec<VirtualMachine>, WorkloadError> {
        info!(name, format, "loading workload trace");
        let source = self.resolver.resolve(name, format)?;
        let machines = self.load_source(source.as_ref())?;
        info!(name, machines = machines.len(), "loaded workload trace");
        Ok(machines)
    }

    /// Load virtual machines from an already opened trace source
    pub fn load_source(
        &self,
        source: &dyn TraceSource,
    ) -> Result<Vec<VirtualMachine>, WorkloadError> {
        let mut builders = scan_fragments(source)?;
        let interference = build_interference_model(source)?;
        join_metadata(source, &mut builders, &interference)
    }
}

/// One pass over the resource-state table, one trace builder per machine id
///
/// The stream is dropped on every exit path, releasing the table.
fn scan_fragments(
    source: &dyn TraceSource,
) -> Result<HashMap<String, VmTraceBuilder>, WorkloadError> {
    let rows = source.resource_states()?;
    let mut builders: HashMap<String, VmTraceBuilder> = HashMap::new();

    for row in rows {
        let row = row?;
        let deadline_ms = row.timestamp.timestamp_millis();
        let timestamp_ms = deadline_ms - row.duration.num_milliseconds();
        builders
            .entry(row.id)
            .or_default()
            .add(timestamp_ms, deadline_ms, row.cpu_usage_mhz, row.cpu_count);
    }

    Ok(builders)
}

/// One pass over the interference-group table
fn build_interference_model(source: &dyn TraceSource) -> Result<InterferenceModel, WorkloadError> {
    let rows = source.interference_groups()?;
    let mut builder = InterferenceModel::builder();

    for row in rows {
        let row = row?;
        builder.add_group(row.members, row.target_ratio, row.score);
    }

    Ok(builder.build())
}

/// One pass over the resource table, joining each row against its builder
///
/// A metadata row without demand samples is not schedulable and is skipped.
/// Taking the builder out of the map also guarantees at most one machine per
/// id. Identity is a name-based UUID over `(id, counter)` with the counter
/// advancing per matched row in scan order, so identical traces load to
/// identical identities.
fn join_metadata(
    source: &dyn TraceSource,
    builders: &mut HashMap<String, VmTraceBuilder>,
    interference: &InterferenceModel,
) -> Result<Vec<VirtualMachine>, WorkloadError> {
    let rows = source.resources()?;
    let mut machines = Vec::new();
    let mut counter = 0u64;

    for row in rows {
        let row = row?;
        let Some(builder) = builders.remove(&row.id) else {
            debug!(id = %row.id, "metadata row has no demand samples, skipping");
            continue;
        };

        let uid = Uuid::new_v3(
            &Uuid::NAMESPACE_OID,
            format!("{}-{}", row.id, counter).as_bytes(),
        );
        counter += 1;

        let trace = builder.build();
        let total_load = trace.total_load();

        machines.push(VirtualMachine {
            uid,
            interference_profile: interference.profile_for(&row.id),
            name: row.id,
            cpu_count: row.cpu_count,
            cpu_capacity_mhz: row.cpu_capacity_mhz,
            gpu_capacity_mhz: 0.0,
            mem_capacity_mb: (row.mem_capacity_kb / MEM_KB_PER_MB).round() as i64,
            total_load,
            start_time: row.start_time,
            stop_time: row.stop_time,
            trace,
        });
    }

    // Stable sort: machines sharing a start time keep their join order.
    machines.sort_by_key(|vm| vm.start_time);

    Ok(machines)
}
