//! Event synthesis by rejection sampling
//!
//! Draws (artifact, execution) pairs from the popularity distributions and
//! turns them into events. For OUTPUT workloads a draw whose artifact is
//! already an OUTPUT target (this run or in the store) is thrown away and
//! redrawn.
//!
//! After every rejection the artifact distribution is rebuilt with all known
//! OUTPUT targets masked out. Every rejection therefore shrinks the set of
//! drawable artifacts, and synthesis fails once that set is empty instead of
//! spinning. Conditioning on "not yet used" this way draws from the same
//! distribution plain rejection sampling would.

use anyhow::{bail, Result};
use rand::Rng;
use tracing::{debug, trace, warn};

use crate::constants::{BENCHMARK_STEP_KEY, MAX_BATCH_PREALLOCATION, REJECTION_WARN_INTERVAL};
use crate::output_guard::OutputArtifactGuard;
use crate::population::Population;
use crate::popularity::PopularityDistribution;
use crate::store::MetadataStore;
use crate::types::{Event, EventBatch, EventPath, EventType};

/// Counters accumulated across every batch of one set-up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisStats {
    pub accepted: u64,
    pub rejected: u64,
    pub bytes: u64,
}

pub struct EventSynthesizer<'a> {
    population: &'a Population,
    artifact_dist: &'a PopularityDistribution,
    execution_dist: &'a PopularityDistribution,
    event_type: EventType,
    max_consecutive_rejections: Option<u64>,
    /// `artifact_dist` minus the OUTPUT targets known at the last rejection
    eligible: Option<PopularityDistribution>,
    stats: SynthesisStats,
}

impl<'a> EventSynthesizer<'a> {
    pub fn new(
        population: &'a Population,
        artifact_dist: &'a PopularityDistribution,
        execution_dist: &'a PopularityDistribution,
        event_type: EventType,
    ) -> Self {
        Self {
            population,
            artifact_dist,
            execution_dist,
            event_type,
            max_consecutive_rejections: None,
            eligible: None,
            stats: SynthesisStats::default(),
        }
    }

    pub fn with_max_consecutive_rejections(mut self, limit: Option<u64>) -> Self {
        self.max_consecutive_rejections = limit;
        self
    }

    pub fn stats(&self) -> SynthesisStats {
        self.stats
    }

    /// Produce exactly `num_events` events for one write request.
    pub async fn synthesize<R: Rng + ?Sized>(
        &mut self,
        num_events: u64,
        rng: &mut R,
        store: &dyn MetadataStore,
        guard: &mut OutputArtifactGuard,
    ) -> Result<EventBatch> {
        let mut batch = EventBatch::with_capacity(num_events.min(MAX_BATCH_PREALLOCATION) as usize);
        let mut consecutive_rejections = 0u64;

        while (batch.len() as u64) < num_events {
            let artifact_dist = self.eligible.as_ref().unwrap_or(self.artifact_dist);
            let artifact_id = self.population.artifact_id(artifact_dist.sample(rng));
            let execution_id = self.population.execution_id(self.execution_dist.sample(rng));

            if self.event_type == EventType::Output && !guard.claim(store, artifact_id).await? {
                consecutive_rejections += 1;
                self.stats.rejected += 1;
                trace!("rejected OUTPUT draw for artifact {}", artifact_id);
                self.exclude_used(guard)?;
                self.check_starvation(consecutive_rejections, guard)?;
                // A draw rejected from the local set never awaits anything
                tokio::task::yield_now().await;
                continue;
            }

            consecutive_rejections = 0;
            batch.push(Event {
                event_type: self.event_type,
                artifact_id,
                execution_id,
                path: EventPath::single_key(BENCHMARK_STEP_KEY),
            });
        }

        self.stats.accepted += batch.len() as u64;
        self.stats.bytes += batch.bytes();
        Ok(batch)
    }

    fn exclude_used(&mut self, guard: &OutputArtifactGuard) -> Result<()> {
        let population = self.population;
        match self.artifact_dist.without(|i| guard.contains(population.artifact_id(i)))? {
            Some(dist) => {
                debug!(
                    "{} artifacts still drawable for OUTPUT events",
                    dist.support_len()
                );
                self.eligible = Some(dist);
                Ok(())
            }
            None => bail!(
                "All {} drawable artifacts (of {}) are already OUTPUT targets; no eligible artifact remains",
                self.artifact_dist.support_len(),
                population.artifacts().len()
            ),
        }
    }

    fn check_starvation(&self, consecutive: u64, guard: &OutputArtifactGuard) -> Result<()> {
        let total = self.population.artifacts().len();
        if let Some(limit) = self.max_consecutive_rejections {
            if consecutive >= limit {
                bail!(
                    "Gave up after {} consecutive rejected OUTPUT draws ({} of {} artifacts already used)",
                    consecutive,
                    guard.len(),
                    total
                );
            }
        }
        if consecutive % REJECTION_WARN_INTERVAL == 0 {
            warn!(
                "{} consecutive OUTPUT draws rejected ({} of {} artifacts used); \
                 the store may already hold OUTPUT events for most artifacts",
                consecutive,
                guard.len(),
                total
            );
        }
        Ok(())
    }
}
