//! Error taxonomy for trace access

use thiserror::Error;

/// Errors surfaced while opening or reading a trace dataset
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace resource could not be opened or read
    #[error("failed to read trace data: {0}")]
    Io(#[from] std::io::Error),

    /// A table is missing an expected column or holds a malformed value
    #[error("malformed {table} table: {message}")]
    Format {
        /// Name of the offending table
        table: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// The requested trace format is not supported
    #[error("unknown trace format {0:?}")]
    UnknownFormat(String),
}

impl TraceError {
    /// Shorthand for a format error on the given table
    pub fn format(table: &'static str, message: impl Into<String>) -> Self {
        Self::Format {
            table,
            message: message.into(),
        }
    }
}
