//! Metadata store interface and an in-memory implementation
//!
//! The benchmark only needs two calls on the hot path: look up the events
//! attached to an artifact, and write a batch of events. Discovery of the
//! existing population uses the two listing calls.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::constants::{DEFAULT_ARTIFACT_TYPE_ID, DEFAULT_EXECUTION_TYPE_ID};
use crate::types::{Artifact, Event, EventType, Execution};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Events referencing any of `artifact_ids`. May answer `NotFound` when
    /// none exist.
    async fn get_events_by_artifact_ids(&self, artifact_ids: &[i64]) -> Result<Vec<Event>, StoreError>;

    /// Persist a batch of events in one call.
    async fn put_events(&self, events: &[Event]) -> Result<(), StoreError>;

    async fn get_artifacts(&self) -> Result<Vec<Artifact>, StoreError>;

    async fn get_executions(&self) -> Result<Vec<Execution>, StoreError>;
}

#[derive(Debug, Default)]
struct StoreState {
    artifacts: Vec<Artifact>,
    executions: Vec<Execution>,
    artifact_ids: HashSet<i64>,
    execution_ids: HashSet<i64>,
    events: Vec<Event>,
    events_by_artifact: HashMap<i64, Vec<usize>>,
    output_artifacts: HashSet<i64>,
}

/// Process-local store used by the CLI and the tests.
///
/// Writes are atomic per batch: a batch that fails validation leaves the
/// store untouched.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    queries: AtomicU64,
    writes: AtomicU64,
    fail_next_query: Mutex<Option<StoreError>>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with artifacts `1..=num_artifacts` and executions
    /// `1..=num_executions`.
    pub fn with_population(num_artifacts: u64, num_executions: u64) -> Self {
        let store = Self::new();
        for _ in 0..num_artifacts {
            store.add_artifact(DEFAULT_ARTIFACT_TYPE_ID);
        }
        for _ in 0..num_executions {
            store.add_execution(DEFAULT_EXECUTION_TYPE_ID);
        }
        store
    }

    pub fn add_artifact(&self, type_id: i64) -> i64 {
        let mut state = self.state.lock();
        let id = state.artifacts.len() as i64 + 1;
        state.artifacts.push(Artifact {
            id,
            type_id,
            uri: Some(format!("mem://artifacts/{id}")),
        });
        state.artifact_ids.insert(id);
        id
    }

    pub fn add_execution(&self, type_id: i64) -> i64 {
        let mut state = self.state.lock();
        let id = state.executions.len() as i64 + 1;
        state.executions.push(Execution { id, type_id });
        state.execution_ids.insert(id);
        id
    }

    /// Make the next `get_events_by_artifact_ids` call fail with `err`.
    pub fn fail_next_query(&self, err: StoreError) {
        *self.fail_next_query.lock() = Some(err);
    }

    /// Toggle a persistent outage: every call fails with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    pub fn event_count(&self) -> usize {
        self.state.lock().events.len()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("in-memory store marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for InMemoryStore {
    async fn get_events_by_artifact_ids(&self, artifact_ids: &[i64]) -> Result<Vec<Event>, StoreError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;
        if let Some(err) = self.fail_next_query.lock().take() {
            return Err(err);
        }

        let state = self.state.lock();
        let found: Vec<Event> = artifact_ids
            .iter()
            .filter_map(|id| state.events_by_artifact.get(id))
            .flatten()
            .map(|&idx| state.events[idx].clone())
            .collect();

        if found.is_empty() {
            return Err(StoreError::NotFound(format!("no events for artifacts {:?}", artifact_ids)));
        }
        Ok(found)
    }

    async fn put_events(&self, events: &[Event]) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;

        let mut state = self.state.lock();

        // Validate the whole batch before touching anything
        let mut batch_outputs = HashSet::new();
        for event in events {
            if !state.artifact_ids.contains(&event.artifact_id) {
                return Err(StoreError::InvalidArgument(format!(
                    "unknown artifact id {}",
                    event.artifact_id
                )));
            }
            if !state.execution_ids.contains(&event.execution_id) {
                return Err(StoreError::InvalidArgument(format!(
                    "unknown execution id {}",
                    event.execution_id
                )));
            }
            if event.event_type == EventType::Output
                && (state.output_artifacts.contains(&event.artifact_id)
                    || !batch_outputs.insert(event.artifact_id))
            {
                return Err(StoreError::AlreadyExists(format!(
                    "artifact {} already has an OUTPUT event",
                    event.artifact_id
                )));
            }
        }

        for event in events {
            let idx = state.events.len();
            state.events_by_artifact.entry(event.artifact_id).or_default().push(idx);
            if event.event_type == EventType::Output {
                state.output_artifacts.insert(event.artifact_id);
            }
            state.events.push(event.clone());
        }
        debug!("stored {} events ({} total)", events.len(), state.events.len());
        Ok(())
    }

    async fn get_artifacts(&self) -> Result<Vec<Artifact>, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().artifacts.clone())
    }

    async fn get_executions(&self) -> Result<Vec<Execution>, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().executions.clone())
    }
}
