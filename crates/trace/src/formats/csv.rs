//! CSV directory trace format
//!
//! A trace is a directory holding two CSV tables and one optional JSON table:
//! - `resource_states.csv` with header `id,timestamp,duration,cpu_count,cpu_usage`
//! - `resources.csv` with header `id,start_time,stop_time,cpu_count,cpu_capacity,mem_capacity`
//! - `interference_groups.json`: an array of `{ "members": [..], "target": f, "score": f }`
//!
//! Instants are epoch milliseconds, durations plain milliseconds and memory
//! capacity kB. Headers are validated when a table is opened, so a missing
//! column fails before any row is consumed.

use crate::error::TraceError;
use crate::row::{InterferenceGroupRow, ResourceRow, ResourceStateRow};
use crate::source::{RowStream, TraceSource};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

const RESOURCE_STATES_TABLE: &str = "resource_states";
const RESOURCES_TABLE: &str = "resources";
const INTERFERENCE_TABLE: &str = "interference_groups";

const RESOURCE_STATES_FILE: &str = "resource_states.csv";
const RESOURCES_FILE: &str = "resources.csv";
const INTERFERENCE_FILE: &str = "interference_groups.json";

const RESOURCE_STATE_COLUMNS: &[&str] = &["id", "timestamp", "duration", "cpu_count", "cpu_usage"];
const RESOURCE_COLUMNS: &[&str] = &[
    "id",
    "start_time",
    "stop_time",
    "cpu_count",
    "cpu_capacity",
    "mem_capacity",
];

/// A trace stored as a directory of CSV tables
#[derive(Debug)]
pub struct CsvTraceSource {
    dir: PathBuf,
}

impl CsvTraceSource {
    /// Open the trace directory at `dir`
    ///
    /// Both CSV tables must be present; their headers are checked again on
    /// every table open.
    pub fn open(dir: &Path) -> Result<Self, TraceError> {
        for (file, table) in [
            (RESOURCE_STATES_FILE, RESOURCE_STATES_TABLE),
            (RESOURCES_FILE, RESOURCES_TABLE),
        ] {
            if !dir.join(file).is_file() {
                return Err(TraceError::format(
                    table,
                    format!("table file {file} not found in {}", dir.display()),
                ));
            }
        }

        debug!(dir = %dir.display(), "opened csv trace");
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn open_table(
        &self,
        file: &str,
        table: &'static str,
        columns: &[&str],
    ) -> Result<csv::Reader<File>, TraceError> {
        let path = self.dir.join(file);
        if !path.is_file() {
            return Err(TraceError::format(
                table,
                format!("table file {file} not found in {}", self.dir.display()),
            ));
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| csv_error(table, e))?;
        let headers = reader.headers().map_err(|e| csv_error(table, e))?;
        for column in columns {
            if !headers.iter().any(|h| h == *column) {
                return Err(TraceError::format(
                    table,
                    format!("missing column {column:?}"),
                ));
            }
        }

        Ok(reader)
    }
}

impl TraceSource for CsvTraceSource {
    fn resource_states(&self) -> Result<RowStream<'_, ResourceStateRow>, TraceError> {
        let reader = self.open_table(
            RESOURCE_STATES_FILE,
            RESOURCE_STATES_TABLE,
            RESOURCE_STATE_COLUMNS,
        )?;

        Ok(Box::new(reader.into_deserialize().map(|record| {
            let record: ResourceStateRecord =
                record.map_err(|e| csv_error(RESOURCE_STATES_TABLE, e))?;
            record.try_into()
        })))
    }

    fn resources(&self) -> Result<RowStream<'_, ResourceRow>, TraceError> {
        let reader = self.open_table(RESOURCES_FILE, RESOURCES_TABLE, RESOURCE_COLUMNS)?;

        Ok(Box::new(reader.into_deserialize().map(|record| {
            let record: ResourceRecord = record.map_err(|e| csv_error(RESOURCES_TABLE, e))?;
            record.try_into()
        })))
    }

    fn interference_groups(&self) -> Result<RowStream<'_, InterferenceGroupRow>, TraceError> {
        let path = self.dir.join(INTERFERENCE_FILE);
        if !path.is_file() {
            // The interference table is optional.
            return Ok(Box::new(std::iter::empty()));
        }

        let file = File::open(&path)?;
        let records: Vec<InterferenceGroupRecord> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| TraceError::format(INTERFERENCE_TABLE, e.to_string()))?;

        Ok(Box::new(records.into_iter().map(|record| {
            Ok(InterferenceGroupRow {
                members: record.members.into_iter().collect::<HashSet<_>>(),
                target_ratio: record.target,
                score: record.score,
            })
        })))
    }
}

fn csv_error(table: &'static str, err: csv::Error) -> TraceError {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => TraceError::Io(io),
            other => TraceError::format(table, format!("{other:?}")),
        }
    } else {
        TraceError::format(table, err.to_string())
    }
}

fn instant_from_millis(table: &'static str, field: &str, ms: i64) -> Result<DateTime<Utc>, TraceError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| TraceError::format(table, format!("{field} {ms} is out of range")))
}

#[derive(Debug, Deserialize)]
struct ResourceStateRecord {
    id: String,
    timestamp: i64,
    duration: i64,
    cpu_count: i32,
    cpu_usage: f64,
}

impl TryFrom<ResourceStateRecord> for ResourceStateRow {
    type Error = TraceError;

    fn try_from(record: ResourceStateRecord) -> Result<Self, TraceError> {
        let duration = TimeDelta::try_milliseconds(record.duration).ok_or_else(|| {
            TraceError::format(
                RESOURCE_STATES_TABLE,
                format!("duration {} is out of range", record.duration),
            )
        })?;

        Ok(ResourceStateRow {
            timestamp: instant_from_millis(RESOURCE_STATES_TABLE, "timestamp", record.timestamp)?,
            duration,
            id: record.id,
            cpu_count: record.cpu_count,
            cpu_usage_mhz: record.cpu_usage,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ResourceRecord {
    id: String,
    start_time: i64,
    stop_time: i64,
    cpu_count: i32,
    cpu_capacity: f64,
    mem_capacity: f64,
}

impl TryFrom<ResourceRecord> for ResourceRow {
    type Error = TraceError;

    fn try_from(record: ResourceRecord) -> Result<Self, TraceError> {
        Ok(ResourceRow {
            start_time: instant_from_millis(RESOURCES_TABLE, "start_time", record.start_time)?,
            stop_time: instant_from_millis(RESOURCES_TABLE, "stop_time", record.stop_time)?,
            id: record.id,
            cpu_count: record.cpu_count,
            cpu_capacity_mhz: record.cpu_capacity,
            mem_capacity_kb: record.mem_capacity,
        })
    }
}

#[derive(Debug, Deserialize)]
struct InterferenceGroupRecord {
    members: Vec<String>,
    target: f64,
    score: f64,
}
