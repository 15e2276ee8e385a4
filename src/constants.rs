// src/constants.rs
//
// Central location for the constants used throughout mdstore-bench

// =============================================================================
// Event Synthesis
// =============================================================================

/// Key of the single path step attached to every synthesized event
pub const BENCHMARK_STEP_KEY: &str = "foo";

/// Fixed per-event byte estimate: two 8-byte ids plus a 1-byte type tag
pub const EVENT_FIXED_OVERHEAD_BYTES: u64 = 8 * 2 + 1;

/// Emit a warning every time this many draws in a row have been rejected
/// while looking for an unused OUTPUT artifact
pub const REJECTION_WARN_INTERVAL: u64 = 10_000;

/// Upper bound on events reserved up front for one batch; larger batches
/// grow as events are accepted
pub const MAX_BATCH_PREALLOCATION: u64 = 4096;

/// Largest `num_events.maximum` a config may request per write request
pub const MAX_EVENTS_PER_OPERATION: u64 = 1_000_000;

/// Name prefix reported for the fill-events workload
pub const FILL_EVENTS_NAME_PREFIX: &str = "FILL_EVENTS_";

// =============================================================================
// Configuration Defaults
// =============================================================================

/// Default number of pre-generated operations (one batch each)
pub const DEFAULT_NUM_OPERATIONS: u64 = 100;

/// Default Dirichlet concentration for node popularity (1.0 = flat prior)
pub const DEFAULT_DIRICHLET_ALPHA: f64 = 1.0;

/// Default population sizes seeded into the in-memory store by the CLI
pub const DEFAULT_POPULATION_ARTIFACTS: u64 = 1000;
pub const DEFAULT_POPULATION_EXECUTIONS: u64 = 1000;

/// Type ids assigned to nodes created by the in-memory store
pub const DEFAULT_ARTIFACT_TYPE_ID: i64 = 1;
pub const DEFAULT_EXECUTION_TYPE_ID: i64 = 2;

// =============================================================================
// Metrics
// =============================================================================

/// Latency histogram bounds (microseconds): 1µs .. 1 hour, 3 significant digits
pub const HISTOGRAM_MIN_US: u64 = 1;
pub const HISTOGRAM_MAX_US: u64 = 3_600_000_000;
pub const HISTOGRAM_SIGFIGS: u8 = 3;
