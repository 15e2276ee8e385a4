//! TSV export for machine-readable benchmark results

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::metrics::Summary;

const HEADER: &str = "workload\tops\tevents\tbytes\tsetup_s\twall_s\tops_per_sec\tbytes_per_sec\tmean_us\tp50_us\tp95_us\tp99_us\tmax_us";

/// TSV exporter for benchmark results
pub struct TsvExporter {
    basename: String,
}

impl TsvExporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            basename: path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// `<basename>-results.tsv`
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(format!("{}-results.tsv", self.basename))
    }

    /// Write the header and one row per summary
    pub fn export(&self, summaries: &[Summary]) -> Result<PathBuf> {
        let path = self.output_path();
        let mut f = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        writeln!(f, "{}", HEADER)?;
        for s in summaries {
            writeln!(f, "{}", row(s))?;
        }
        Ok(path)
    }
}

fn row(s: &Summary) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{:.3}\t{:.3}\t{:.2}\t{:.2}\t{}\t{}\t{}\t{}\t{}",
        s.workload,
        s.ops,
        s.events,
        s.bytes,
        s.setup_seconds,
        s.wall_seconds,
        s.ops_per_sec(),
        s.bytes_per_sec(),
        s.latency.mean_us,
        s.latency.p50_us,
        s.latency.p95_us,
        s.latency.p99_us,
        s.latency.max_us
    )
}
