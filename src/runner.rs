//! Drives a workload through its full lifecycle and times every operation

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::time::Instant;
use tracing::info;

use crate::metrics::{OpStats, Summary};
use crate::store::MetadataStore;
use crate::workload::Workload;

/// set_up, run every pre-generated operation in order, tear_down.
///
/// Set-up time is reported separately and excluded from throughput. The
/// first failing operation aborts the run; tear_down still happens.
pub async fn run_workload(
    workload: &mut dyn Workload,
    store: &dyn MetadataStore,
    progress: Option<&ProgressBar>,
) -> Result<Summary> {
    let name = workload.name();

    let setup_start = Instant::now();
    workload
        .set_up(store)
        .await
        .with_context(|| format!("{}: set-up failed", name))?;
    let setup_seconds = setup_start.elapsed().as_secs_f64();

    let num_ops = workload.num_operations();
    if let Some(pb) = progress {
        pb.set_length(num_ops as u64);
    }

    let mut stats = OpStats::new();
    let start = Instant::now();
    let result = run_ops(workload, store, &mut stats, progress).await;
    let wall_seconds = start.elapsed().as_secs_f64();

    workload.tear_down()?;
    result?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    info!("{}: {} operations in {:.2}s", name, stats.ops, wall_seconds);
    Ok(Summary::from_stats(name, setup_seconds, wall_seconds, &stats))
}

async fn run_ops(
    workload: &mut dyn Workload,
    store: &dyn MetadataStore,
    stats: &mut OpStats,
    progress: Option<&ProgressBar>,
) -> Result<()> {
    for i in 0..workload.num_operations() {
        let t0 = Instant::now();
        let outcome = workload.run_op(i, store).await?;
        stats.record(outcome, t0.elapsed());
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }
    Ok(())
}
