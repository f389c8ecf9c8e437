//! Gap-filling reconstruction of a single machine's demand trace

use crate::models::{TraceFragment, VmTrace};

/// Builds the demand trace of one virtual machine from its samples
///
/// Samples must be added in time order. Whenever a sample does not start at
/// the previous sample's deadline, the uncovered interval is filled with a
/// zero-usage, zero-core fragment, so the built trace treats unobserved time
/// as fully idle rather than undefined.
///
/// [`build`](Self::build) consumes the builder, so a finished trace can no
/// longer be appended to.
#[derive(Debug, Default)]
pub struct VmTraceBuilder {
    fragments: Vec<TraceFragment>,
    total_load: f64,
    previous_deadline: Option<i64>,
}

impl VmTraceBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one observed sample
    ///
    /// `timestamp_ms` is the start and `deadline_ms` the end of the sampled
    /// window; a deadline before the timestamp is clamped to a zero-length
    /// window instead of being rejected.
    pub fn add(&mut self, timestamp_ms: i64, deadline_ms: i64, cpu_usage_mhz: f64, cpu_cores: i32) {
        let duration = (deadline_ms - timestamp_ms).max(0);
        self.total_load += cpu_usage_mhz * duration as f64 / 1000.0;

        if self.previous_deadline != Some(timestamp_ms) {
            if let Some(last_end) = self.fragments.last().map(|f| f.end_ms) {
                if timestamp_ms > last_end {
                    self.fragments.push(TraceFragment {
                        start_ms: last_end,
                        end_ms: timestamp_ms,
                        cpu_usage_mhz: 0.0,
                        cpu_cores: 0,
                    });
                }
            }
        }

        self.fragments.push(TraceFragment {
            start_ms: timestamp_ms,
            end_ms: timestamp_ms + duration,
            cpu_usage_mhz,
            cpu_cores,
        });
        self.previous_deadline = Some(deadline_ms);
    }

    /// Finalize the trace
    pub fn build(self) -> VmTrace {
        VmTrace::new(self.fragments, self.total_load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_between_samples_is_filled_with_idle_time() {
        let mut builder = VmTraceBuilder::new();
        builder.add(0, 1000, 100.0, 4);
        builder.add(2000, 3000, 50.0, 4);

        let trace = builder.build();
        let fragments = trace.fragments();
        assert_eq!(fragments.len(), 3);
        assert_eq!(
            fragments[1],
            TraceFragment {
                start_ms: 1000,
                end_ms: 2000,
                cpu_usage_mhz: 0.0,
                cpu_cores: 0,
            }
        );
        assert!(fragments[1].is_idle());
        assert_eq!(trace.total_load(), 150.0);
    }

    #[test]
    fn built_trace_is_contiguous() {
        let mut builder = VmTraceBuilder::new();
        builder.add(0, 500, 10.0, 1);
        builder.add(500, 1500, 20.0, 1);
        builder.add(4000, 4100, 30.0, 2);
        builder.add(9000, 9500, 40.0, 2);

        let trace = builder.build();
        for pair in trace.fragments().windows(2) {
            assert_eq!(pair[0].end_ms, pair[1].start_ms);
        }
        assert!(trace.fragments().iter().all(|f| f.end_ms >= f.start_ms));
    }

    #[test]
    fn contiguous_samples_get_no_filler() {
        let mut builder = VmTraceBuilder::new();
        builder.add(0, 1000, 100.0, 2);
        builder.add(1000, 2000, 200.0, 2);

        let trace = builder.build();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.total_load(), 300.0);
    }

    #[test]
    fn total_load_sums_only_real_samples() {
        let mut builder = VmTraceBuilder::new();
        builder.add(0, 2000, 100.0, 1);
        builder.add(5000, 6000, 300.0, 1);

        let trace = builder.build();
        // 100 * 2000 / 1000 + 300 * 1000 / 1000; the filler adds nothing.
        assert_eq!(trace.total_load(), 500.0);
    }

    #[test]
    fn negative_span_is_clamped_to_zero_duration() {
        let mut builder = VmTraceBuilder::new();
        builder.add(1000, 500, 100.0, 1);

        let trace = builder.build();
        assert_eq!(trace.total_load(), 0.0);
        assert_eq!(trace.fragments()[0].duration_ms(), 0);
    }

    #[test]
    fn empty_builder_yields_empty_trace() {
        let trace = VmTraceBuilder::new().build();
        assert!(trace.is_empty());
        assert_eq!(trace.total_load(), 0.0);
    }
}
