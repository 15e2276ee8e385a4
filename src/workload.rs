// src/workload.rs
//
// Workload lifecycle and the fill-events workload
//
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::{Config, FillEventsConfig};
use crate::constants::FILL_EVENTS_NAME_PREFIX;
use crate::output_guard::OutputArtifactGuard;
use crate::population::Population;
use crate::popularity::PopularityDistribution;
use crate::store::MetadataStore;
use crate::synthesizer::{EventSynthesizer, SynthesisStats};
use crate::types::{EventBatch, EventType};

/// What a single run operation sent to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpOutcome {
    pub events: u64,
    pub bytes: u64,
}

/// Lifecycle a benchmark harness drives:
/// `set_up` once, `run_op(i)` for every `i < num_operations()`, `tear_down`.
#[async_trait]
pub trait Workload: Send {
    /// Pre-generate all work items. Fails if already set up.
    async fn set_up(&mut self, store: &dyn MetadataStore) -> Result<()>;

    /// Execute the `index`-th pre-generated work item.
    async fn run_op(&mut self, index: usize, store: &dyn MetadataStore) -> Result<OpOutcome>;

    /// Drop all work items. Safe to call repeatedly.
    fn tear_down(&mut self) -> Result<()>;

    fn num_operations(&self) -> usize;

    fn name(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadState {
    Unstarted,
    Ready,
    TornDown,
}

/// Writes batches of INPUT or OUTPUT events between existing artifacts and
/// executions.
pub struct FillEvents {
    config: FillEventsConfig,
    num_operations: usize,
    max_consecutive_rejections: Option<u64>,
    population: Population,
    rng: StdRng,
    guard: OutputArtifactGuard,
    work_items: Vec<EventBatch>,
    stats: SynthesisStats,
    state: WorkloadState,
    name: String,
}

impl FillEvents {
    pub fn new(config: FillEventsConfig, num_operations: u64, population: Population, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        debug!("fill-events generator seed: {}", seed);
        let name = format!("{}{}", FILL_EVENTS_NAME_PREFIX, config.specification.as_str());
        Self {
            config,
            num_operations: num_operations as usize,
            max_consecutive_rejections: None,
            population,
            rng: StdRng::seed_from_u64(seed),
            guard: OutputArtifactGuard::new(),
            work_items: Vec::new(),
            stats: SynthesisStats::default(),
            state: WorkloadState::Unstarted,
            name,
        }
    }

    /// Build from a validated top-level config
    pub fn from_config(cfg: &Config, population: Population) -> Self {
        Self::new(cfg.fill_events.clone(), cfg.num_operations, population, cfg.seed)
            .with_max_consecutive_rejections(cfg.max_consecutive_rejections)
    }

    pub fn with_max_consecutive_rejections(mut self, limit: Option<u64>) -> Self {
        self.max_consecutive_rejections = limit;
        self
    }

    pub fn state(&self) -> WorkloadState {
        self.state
    }

    /// Pre-generated write requests, in run order
    pub fn work_items(&self) -> &[EventBatch] {
        &self.work_items
    }

    pub fn synthesis_stats(&self) -> SynthesisStats {
        self.stats
    }

    /// Total byte estimate across all pre-generated batches
    pub fn total_bytes(&self) -> u64 {
        self.work_items.iter().map(EventBatch::bytes).sum()
    }

    async fn generate(&mut self, store: &dyn MetadataStore) -> Result<Vec<EventBatch>> {
        self.config.validate()?;
        let range = self.config.num_events;

        let artifact_dist = PopularityDistribution::dirichlet(
            self.population.artifacts().len(),
            self.config.artifact_node_popularity.dirichlet_alpha,
            &mut self.rng,
        )
        .context("artifact popularity")?;
        let execution_dist = PopularityDistribution::dirichlet(
            self.population.executions().len(),
            self.config.execution_node_popularity.dirichlet_alpha,
            &mut self.rng,
        )
        .context("execution popularity")?;

        let drawable = artifact_dist.support_len();
        let worst_case = (self.num_operations as u64).saturating_mul(range.maximum);
        if self.config.specification == EventType::Output && worst_case > drawable as u64 {
            warn!(
                "{}: up to {} OUTPUT events requested but only {} of {} artifacts have non-zero popularity",
                self.name,
                worst_case,
                drawable,
                self.population.artifacts().len()
            );
        }

        let mut synthesizer = EventSynthesizer::new(
            &self.population,
            &artifact_dist,
            &execution_dist,
            self.config.specification,
        )
        .with_max_consecutive_rejections(self.max_consecutive_rejections);

        let mut batches = Vec::with_capacity(self.num_operations);
        for i in 0..self.num_operations {
            let num_events = self.rng.random_range(range.minimum..=range.maximum);
            let batch = synthesizer
                .synthesize(num_events, &mut self.rng, store, &mut self.guard)
                .await
                .with_context(|| format!("generating work item {}", i))?;
            debug!("work item {}: {} events, {} bytes", i, batch.len(), batch.bytes());
            batches.push(batch);
        }

        self.stats = synthesizer.stats();
        Ok(batches)
    }
}

#[async_trait]
impl Workload for FillEvents {
    async fn set_up(&mut self, store: &dyn MetadataStore) -> Result<()> {
        if self.state != WorkloadState::Unstarted {
            bail!("{}: set_up called twice", self.name);
        }
        info!("Setting up {} ({} operations)...", self.name, self.num_operations);

        self.guard.reset();
        self.work_items.clear();
        self.stats = SynthesisStats::default();

        let batches = self.generate(store).await?;
        self.work_items = batches;
        self.state = WorkloadState::Ready;

        info!(
            "{} ready: {} events in {} work items, {} bytes estimated, {} draws rejected, {} store lookups",
            self.name,
            self.stats.accepted,
            self.work_items.len(),
            self.stats.bytes,
            self.stats.rejected,
            self.guard.store_queries()
        );
        Ok(())
    }

    async fn run_op(&mut self, index: usize, store: &dyn MetadataStore) -> Result<OpOutcome> {
        if self.state != WorkloadState::Ready {
            bail!("{}: run_op called before set_up (state {:?})", self.name, self.state);
        }
        let batch = self.work_items.get(index).ok_or_else(|| {
            anyhow!(
                "{}: work item {} out of range ({} generated)",
                self.name,
                index,
                self.work_items.len()
            )
        })?;

        store
            .put_events(batch.events())
            .await
            .with_context(|| format!("{}: put_events for work item {}", self.name, index))?;

        Ok(OpOutcome {
            events: batch.len() as u64,
            bytes: batch.bytes(),
        })
    }

    fn tear_down(&mut self) -> Result<()> {
        self.work_items.clear();
        self.work_items.shrink_to_fit();
        if self.state == WorkloadState::Ready {
            self.state = WorkloadState::TornDown;
        }
        Ok(())
    }

    fn num_operations(&self) -> usize {
        self.num_operations
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
