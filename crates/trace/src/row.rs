//! Typed rows for the three trace tables

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashSet;

/// One sample from the resource-state table
///
/// `timestamp` marks the *end* of the sampling window; the window starts at
/// `timestamp - duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceStateRow {
    /// Identifier of the virtual machine the sample belongs to
    pub id: String,
    /// End of the sampling window
    pub timestamp: DateTime<Utc>,
    /// Length of the sampling window
    pub duration: TimeDelta,
    /// Number of CPU cores in use during the window
    pub cpu_count: i32,
    /// Average CPU demand during the window (MHz)
    pub cpu_usage_mhz: f64,
}

/// One row from the resource (metadata) table
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRow {
    /// Identifier of the virtual machine
    pub id: String,
    /// Submission time of the virtual machine
    pub start_time: DateTime<Utc>,
    /// Time at which the virtual machine stops
    pub stop_time: DateTime<Utc>,
    /// Number of provisioned CPU cores
    pub cpu_count: i32,
    /// Provisioned CPU capacity (MHz)
    pub cpu_capacity_mhz: f64,
    /// Provisioned memory capacity (kB)
    pub mem_capacity_kb: f64,
}

/// One row from the interference-group table
#[derive(Debug, Clone, PartialEq)]
pub struct InterferenceGroupRow {
    /// Names of the virtual machines that interfere with each other
    pub members: HashSet<String>,
    /// Load threshold above which the group degrades
    pub target_ratio: f64,
    /// Performance score applied while the group is saturated
    pub score: f64,
}
