//! Latency and throughput accounting for workload runs
//!
//! One HDR histogram of per-operation latency (microseconds) plus counters
//! for operations, events and estimated bytes.

use hdrhistogram::Histogram;
use std::time::Duration;

use crate::constants::{HISTOGRAM_MAX_US, HISTOGRAM_MIN_US, HISTOGRAM_SIGFIGS};
use crate::workload::OpOutcome;

#[derive(Debug, Clone)]
pub struct OpStats {
    hist: Histogram<u64>,
    pub ops: u64,
    pub events: u64,
    pub bytes: u64,
}

impl OpStats {
    pub fn new() -> Self {
        Self {
            hist: Histogram::<u64>::new_with_bounds(HISTOGRAM_MIN_US, HISTOGRAM_MAX_US, HISTOGRAM_SIGFIGS)
                .expect("failed to allocate histogram"),
            ops: 0,
            events: 0,
            bytes: 0,
        }
    }

    pub fn record(&mut self, outcome: OpOutcome, latency: Duration) {
        let micros = (latency.as_micros() as u64).max(HISTOGRAM_MIN_US);
        // saturating_record clamps values above the upper bound
        self.hist.saturating_record(micros);
        self.ops += 1;
        self.events += outcome.events;
        self.bytes += outcome.bytes;
    }

    pub fn histogram(&self) -> &Histogram<u64> {
        &self.hist
    }

    pub fn latency(&self) -> LatencySummary {
        if self.hist.is_empty() {
            return LatencySummary::default();
        }
        LatencySummary {
            mean_us: self.hist.mean() as u64,
            p50_us: self.hist.value_at_quantile(0.50),
            p95_us: self.hist.value_at_quantile(0.95),
            p99_us: self.hist.value_at_quantile(0.99),
            max_us: self.hist.max(),
        }
    }
}

impl Default for OpStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencySummary {
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Result of one complete set-up / run / tear-down cycle
#[derive(Debug, Clone)]
pub struct Summary {
    pub workload: String,
    pub setup_seconds: f64,
    pub wall_seconds: f64,
    pub ops: u64,
    pub events: u64,
    pub bytes: u64,
    pub latency: LatencySummary,
}

impl Summary {
    pub fn from_stats(workload: String, setup_seconds: f64, wall_seconds: f64, stats: &OpStats) -> Self {
        Self {
            workload,
            setup_seconds,
            wall_seconds,
            ops: stats.ops,
            events: stats.events,
            bytes: stats.bytes,
            latency: stats.latency(),
        }
    }

    pub fn ops_per_sec(&self) -> f64 {
        self.ops as f64 / self.wall_seconds.max(1e-9)
    }

    pub fn bytes_per_sec(&self) -> f64 {
        self.bytes as f64 / self.wall_seconds.max(1e-9)
    }

    pub fn print(&self) {
        let mib = self.bytes as f64 / (1024.0 * 1024.0);
        println!(
            "{}  SETUP {:.2}s  WALL {:.2}s  OPS {}  EVENTS {}  BYTES {} ({:.2} MiB)",
            self.workload, self.setup_seconds, self.wall_seconds, self.ops, self.events, self.bytes, mib
        );
        println!(
            "  {:.2} ops/s  {:.2} bytes/s  mean={}µs p50={}µs p95={}µs p99={}µs max={}µs",
            self.ops_per_sec(),
            self.bytes_per_sec(),
            self.latency.mean_us,
            self.latency.p50_us,
            self.latency.p95_us,
            self.latency.p99_us,
            self.latency.max_us
        );
    }
}
