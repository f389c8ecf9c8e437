//! Typed access to workload trace datasets
//!
//! This crate provides the table access layer for workload traces:
//! - Typed rows for the resource, resource-state and interference-group tables
//! - The [`TraceSource`] trait: forward-only row streams per table
//! - A CSV directory format and an in-memory source for tests and
//!   synthetic workloads

pub mod error;
pub mod formats;
pub mod row;
pub mod source;

pub use error::TraceError;
pub use formats::csv::CsvTraceSource;
pub use formats::memory::InMemoryTraceSource;
pub use row::{InterferenceGroupRow, ResourceRow, ResourceStateRow};
pub use source::{open_trace, RowStream, TraceSource, FORMAT_CSV};
