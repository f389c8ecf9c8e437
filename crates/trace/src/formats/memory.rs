//! In-memory trace source
//!
//! Holds the three tables as plain row vectors. Used by tests and by callers
//! that generate synthetic workloads programmatically.

use crate::error::TraceError;
use crate::row::{InterferenceGroupRow, ResourceRow, ResourceStateRow};
use crate::source::{RowStream, TraceSource};

/// A trace assembled in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTraceSource {
    resource_states: Vec<ResourceStateRow>,
    resources: Vec<ResourceRow>,
    interference_groups: Vec<InterferenceGroupRow>,
}

impl InMemoryTraceSource {
    /// Create an empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a demand sample
    ///
    /// Samples for one id must be appended in time order; the engine does
    /// not reorder them.
    pub fn push_resource_state(&mut self, row: ResourceStateRow) {
        self.resource_states.push(row);
    }

    /// Append a metadata row
    pub fn push_resource(&mut self, row: ResourceRow) {
        self.resources.push(row);
    }

    /// Append an interference group
    pub fn push_interference_group(&mut self, row: InterferenceGroupRow) {
        self.interference_groups.push(row);
    }
}

impl TraceSource for InMemoryTraceSource {
    fn resource_states(&self) -> Result<RowStream<'_, ResourceStateRow>, TraceError> {
        Ok(Box::new(self.resource_states.iter().cloned().map(Ok)))
    }

    fn resources(&self) -> Result<RowStream<'_, ResourceRow>, TraceError> {
        Ok(Box::new(self.resources.iter().cloned().map(Ok)))
    }

    fn interference_groups(&self) -> Result<RowStream<'_, InterferenceGroupRow>, TraceError> {
        Ok(Box::new(self.interference_groups.iter().cloned().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta};

    #[test]
    fn streams_yield_rows_in_insertion_order() {
        let mut source = InMemoryTraceSource::new();
        for (id, end_ms) in [("a", 1000), ("b", 1000), ("a", 2000)] {
            source.push_resource_state(ResourceStateRow {
                id: id.to_string(),
                timestamp: DateTime::from_timestamp_millis(end_ms).unwrap(),
                duration: TimeDelta::milliseconds(1000),
                cpu_count: 1,
                cpu_usage_mhz: 50.0,
            });
        }

        let ids: Vec<String> = source
            .resource_states()
            .unwrap()
            .map(|row| row.unwrap().id)
            .collect();
        assert_eq!(ids, ["a", "b", "a"]);
    }

    #[test]
    fn empty_source_has_empty_tables() {
        let source = InMemoryTraceSource::new();
        assert_eq!(source.resources().unwrap().count(), 0);
        assert_eq!(source.interference_groups().unwrap().count(), 0);
    }
}
