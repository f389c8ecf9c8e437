//! Core data models for simulated workloads

use crate::interference::InterferenceProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One step of a reconstructed demand trace
///
/// Fragments of one trace are time-ordered, non-overlapping and gapless:
/// every instant between the first start and the last end is covered by
/// exactly one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceFragment {
    /// Start of the fragment (epoch millis)
    pub start_ms: i64,
    /// End of the fragment (epoch millis), never before `start_ms`
    pub end_ms: i64,
    /// Average CPU demand over the fragment (MHz)
    pub cpu_usage_mhz: f64,
    /// Number of CPU cores in use
    pub cpu_cores: i32,
}

impl TraceFragment {
    /// Length of the fragment in milliseconds
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Whether this fragment is a synthetic idle filler
    pub fn is_idle(&self) -> bool {
        self.cpu_usage_mhz == 0.0 && self.cpu_cores == 0
    }
}

/// The reconstructed, immutable demand trace of one virtual machine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VmTrace {
    fragments: Vec<TraceFragment>,
    total_load: f64,
}

impl VmTrace {
    pub(crate) fn new(fragments: Vec<TraceFragment>, total_load: f64) -> Self {
        Self {
            fragments,
            total_load,
        }
    }

    /// The ordered fragments of this trace
    pub fn fragments(&self) -> &[TraceFragment] {
        &self.fragments
    }

    /// Integral of CPU demand over time (MHz·ms / 1000, i.e. MFLOPs)
    ///
    /// Synthetic idle fillers contribute nothing.
    pub fn total_load(&self) -> f64 {
        self.total_load
    }

    /// Number of fragments, fillers included
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether the trace holds no fragments at all
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// A schedulable virtual machine assembled from trace metadata and its
/// reconstructed demand trace
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualMachine {
    /// Deterministic identity, a name-based function of `(name, join counter)`
    pub uid: Uuid,
    /// Identifier of the machine in the source trace
    pub name: String,
    /// Number of provisioned CPU cores
    pub cpu_count: i32,
    /// Provisioned CPU capacity (MHz)
    pub cpu_capacity_mhz: f64,
    /// Provisioned GPU capacity (MHz), zero when the trace carries none
    pub gpu_capacity_mhz: f64,
    /// Provisioned memory capacity (MB)
    pub mem_capacity_mb: i64,
    /// Total CPU load of the demand trace
    pub total_load: f64,
    /// Submission time
    pub start_time: DateTime<Utc>,
    /// Time at which the machine stops, never before `start_time`
    pub stop_time: DateTime<Utc>,
    /// The reconstructed demand trace
    pub trace: VmTrace,
    /// Interference profile, if the machine appears in any interference group
    pub interference_profile: Option<InterferenceProfile>,
}
