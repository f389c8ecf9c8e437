//! The trace source seam

use crate::error::TraceError;
use crate::formats::csv::CsvTraceSource;
use crate::row::{InterferenceGroupRow, ResourceRow, ResourceStateRow};
use std::path::Path;

/// Format tag for CSV directory traces
pub const FORMAT_CSV: &str = "csv";

/// A forward-only cursor over one table
///
/// Dropping the stream releases the underlying resource, so every exit path
/// out of a scan closes the table.
pub type RowStream<'a, T> = Box<dyn Iterator<Item = Result<T, TraceError>> + Send + 'a>;

/// A named workload trace exposing its tables as typed row streams
///
/// Implementations must emit resource-state rows for any single id in time
/// order; interleaving across ids is unconstrained. A source without an
/// interference-group table returns an empty stream for it.
pub trait TraceSource: Send + Sync {
    /// Open a cursor over the resource-state (demand sample) table
    fn resource_states(&self) -> Result<RowStream<'_, ResourceStateRow>, TraceError>;

    /// Open a cursor over the resource (metadata) table
    fn resources(&self) -> Result<RowStream<'_, ResourceRow>, TraceError>;

    /// Open a cursor over the interference-group table
    fn interference_groups(&self) -> Result<RowStream<'_, InterferenceGroupRow>, TraceError>;
}

/// Open the trace at `path` using the given format tag
pub fn open_trace(path: &Path, format: &str) -> Result<Box<dyn TraceSource>, TraceError> {
    match format {
        FORMAT_CSV => Ok(Box::new(CsvTraceSource::open(path)?)),
        other => Err(TraceError::UnknownFormat(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_is_rejected_at_open() {
        let err = open_trace(Path::new("/nonexistent"), "parquet").err().unwrap();
        assert!(matches!(err, TraceError::UnknownFormat(f) if f == "parquet"));
    }
}
