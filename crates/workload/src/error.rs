//! Error taxonomy for workload loading and caching

use sim_trace::TraceError;
use thiserror::Error;

/// Errors surfaced by the workload loader and cache
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// Opening or reading one of the trace tables failed
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// A freshly loaded workload could not be retained by the cache
    ///
    /// Returned instead of handing out data the cache has already discarded;
    /// raising the byte budget or loading outside the cache are the remedies.
    #[error("workload {name:?} exceeds the cache retention budget")]
    CacheExhausted {
        /// Name of the trace whose entry could not be retained
        name: String,
    },
}
